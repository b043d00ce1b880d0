use anyhow::Result;
use rastex::Renderer;
use std::env;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!(
            "Usage: {} <expression> <output> [normal.ttf [italic.ttf [bold.ttf [bolditalic.ttf]]]]",
            args[0]
        );
        std::process::exit(1);
    }

    let expression = &args[1];
    let output = &args[2];

    let renderer = if args.len() > 3 {
        println!("Loading fonts: {}", args[3..].join(", "));
        Renderer::from_font_files(
            &args[3],
            args.get(4).map(String::as_str),
            args.get(5).map(String::as_str),
            args.get(6).map(String::as_str),
        )?
    } else {
        println!("No font files given, using the system sans-serif font");
        Renderer::from_system_font()?
    };

    println!("Rendering expression: {}", expression);
    renderer.render(expression, output)?;
    println!("Saved to {}", output);

    Ok(())
}
