use clap::{Parser as ClapParser, ValueEnum};
use std::{process, thread, time::Duration};

use pixvm::{
    Anchor, Clock, Collaborators, LogStats, Machine, MachineCreateInfo, NullRenderer, Renderer,
    TerminalRenderer, Watchdog, WatchdogConfig, restore_terminal,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum RendererKind {
    None,
    Terminal,
}

#[derive(ClapParser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[arg(long, default_value_t = 1024, help = "Grid width in pixels")]
    width: u32,

    #[arg(long, default_value_t = 1024, help = "Grid height in pixels")]
    height: u32,

    /// Larger regions give programs more radii to address
    #[arg(
        long,
        default_value_t = 1024,
        help = "Half-size of the offset table region, 2 to 4096"
    )]
    region: u32,

    #[arg(long, default_value_t = 100, help = "Ceiling on concurrently running executors")]
    max_executors: usize,

    #[arg(long, default_value_t = 512, help = "X of the anchor the watchdog seeds")]
    anchor_x: u32,

    #[arg(long, default_value_t = 512, help = "Y of the anchor the watchdog seeds")]
    anchor_y: u32,

    #[arg(long, default_value_t = 10, help = "Seconds without forks before reseeding")]
    watchdog_secs: u64,

    #[arg(long, default_value_t = 16, help = "Milliseconds between frames")]
    render_ms: u64,

    #[arg(long, default_value_t = 1000, help = "Milliseconds between stats reports")]
    report_ms: u64,

    #[arg(long, value_enum, default_value_t = RendererKind::None)]
    renderer: RendererKind,

    /// Run forever when absent
    #[arg(long, help = "Stop after this many seconds")]
    run_for: Option<u64>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let info = MachineCreateInfo {
        width: cli.width,
        height: cli.height,
        offset_region: cli.region,
        max_executors: cli.max_executors,
        render_interval: Duration::from_millis(cli.render_ms),
        report_interval: Duration::from_millis(cli.report_ms),
        ..Default::default()
    };

    let renderer: Box<dyn Renderer> = match cli.renderer {
        RendererKind::None => Box::new(NullRenderer::new()),
        RendererKind::Terminal => match TerminalRenderer::new() {
            Ok(renderer) => Box::new(renderer),
            Err(err) => {
                eprintln!("Error opening terminal: {}", err);
                process::exit(1);
            }
        },
    };
    let collaborators = Collaborators {
        clock: Clock::new(info.render_interval, info.report_interval),
        renderer,
        stats: Box::new(LogStats),
    };

    let machine = match Machine::with_collaborators(info, collaborators) {
        Ok(machine) => machine,
        Err(err) => {
            eprintln!("Invalid configuration: {}", err);
            process::exit(1);
        }
    };
    log::info!(
        "{}x{} grid, {} radii per anchor",
        cli.width,
        cli.height,
        machine.space.max_radius()
    );

    let config = WatchdogConfig {
        anchor: Anchor::new(cli.anchor_x, cli.anchor_y),
        interval: Duration::from_secs(cli.watchdog_secs),
        spawn_span: cli.width.min(cli.height),
    };
    // seed right away instead of waiting out the first window
    Watchdog::check(&machine, &config);

    let watchdog = match Watchdog::spawn(machine.clone(), config) {
        Ok(watchdog) => watchdog,
        Err(err) => {
            eprintln!("Error starting watchdog: {}", err);
            process::exit(1);
        }
    };

    match cli.run_for {
        Some(secs) => {
            thread::sleep(Duration::from_secs(secs));
            watchdog.stop();
            watchdog.join();
            if cli.renderer == RendererKind::Terminal {
                restore_terminal();
            }
            log::info!(
                "stopping with {} executors still running",
                machine.admission.active()
            );
        }
        None => watchdog.join(),
    }
}
