//! Property grid demo - builds a small grid, drives it with input events
//! and prints what a host would receive
//!
//! Reads `propgrid.toml` from the working directory when present.

use std::sync::Arc;

use tiny_propgrid::sdk::{InputEvent, Key, KeyEvent, Modifiers};
use tiny_propgrid::{
    ChoiceSet, EngineContext, GridConfig, NodeFlags, NodeSpec, PropertyGrid, RecordingPainter,
    Variant,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = GridConfig::load("propgrid.toml")?;
    let context = Arc::new(EngineContext::new());
    let mut grid = PropertyGrid::with_config(context.clone(), &config);
    let events = grid.subscribe();
    let root = grid.tree().root();

    let shape = grid.append(root, NodeSpec::category("Shape"))?;
    let perimeter = grid.append(
        shape,
        NodeSpec::leaf("perimeter", "Perimeter", "real")
            .unspecified()
            .with_help("Length of the outline")
            .with_attributes("min=0"),
    )?;
    grid.append(shape, NodeSpec::leaf("area", "Area", "real").unspecified())?;
    grid.append(shape, NodeSpec::degree("heading", "Heading"))?;

    let style = grid.append(root, NodeSpec::category("Style"))?;
    grid.append(
        style,
        NodeSpec::leaf("fill", "Fill", "colour").with_value(Variant::Int(0x3875D7)),
    )?;
    let sizes = context.publish_choices("sizes", &["Small", "Medium", "Large"]);
    grid.append(
        style,
        NodeSpec::leaf("size", "Size", "choice").with_choices(sizes).with_value(1i64),
    )?;
    grid.append(
        style,
        NodeSpec::leaf("layers", "Layers", "multichoice")
            .with_choices(ChoiceSet::from_labels(&["Grid", "Labels", "Axes"]))
            .with_value(Variant::StrList(vec!["Grid".into()])),
    )?;
    grid.append(
        style,
        NodeSpec::leaf("debug", "Debug", "bool").with_flags(NodeFlags::HIDEABLE),
    )?;

    grid.resize(360.0, 240.0);

    // Edit Perimeter: select, type, commit
    grid.select(Some(perimeter))?;
    grid.set_editor_text("12.5")?;
    let key = |key| {
        InputEvent::Key(KeyEvent {
            key,
            modifiers: Modifiers::default(),
        })
    };
    grid.handle_input(key(Key::Enter))?;

    // A rejected value keeps the selection where it is
    grid.set_editor_text("-3")?;
    if let Err(err) = grid.handle_input(key(Key::Down)) {
        println!("rejected: {}", err);
        grid.handle_input(key(Key::Escape))?;
    }
    grid.handle_input(key(Key::Down))?;

    let mut painter = RecordingPainter::default();
    let stats = grid.paint(&mut painter);
    println!(
        "painted {} rows with {} fills ({} values, {} glyphs)",
        stats.rows, stats.fills, stats.values, stats.glyphs
    );

    for event in events.try_iter() {
        println!("event: {:?}", event);
    }
    println!("{}", grid.save_json()?);
    Ok(())
}
