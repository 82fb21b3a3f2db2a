//! Main application entry point (native).

#[cfg(feature = "native")]
fn main() {
    use clap::Parser;

    env_logger::init();
    let cli = mindcanvas_app::Cli::parse();
    log::debug!("Starting MindCanvas: {:?}", cli.command);

    if let Err(e) = pollster::block_on(run(cli)) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

#[cfg(feature = "native")]
async fn run(cli: mindcanvas_app::Cli) -> Result<(), mindcanvas_app::AppError> {
    let mut config = mindcanvas_app::AppConfig::load(cli.config.as_deref());
    if let Some(dir) = cli.data_dir {
        config.data_dir = Some(dir);
    }
    let mut app = mindcanvas_app::App::open(&config).await?;
    let output = app.execute(&cli.command).await?;
    print!("{output}");
    if !output.ends_with('\n') {
        println!();
    }
    Ok(())
}

#[cfg(not(feature = "native"))]
fn main() {
    panic!("Native feature not enabled. Use `cargo run --features native`");
}
