use std::{
    io::{BufRead, Write},
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use backdrop::{
    FieldUpdate, Preview, RecordingSurface, SettingField, SettingsForm, SourceSlot, Surface,
    compose, export_to_dir,
};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "backdrop", version)]
struct Cli {
    /// Log at debug level (RUST_LOG overrides).
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compose one image and write it as `image-with-bg-<timestamp>.png`.
    Render(RenderArgs),
    /// Interactive preview driven by commands on stdin.
    Preview(PreviewArgs),
}

#[derive(Args, Debug, Default)]
struct SettingArgs {
    /// Settings JSON; flags below override its fields.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Output width in pixels (100-2000).
    #[arg(long)]
    width: Option<String>,

    /// Output height in pixels (100-2000).
    #[arg(long)]
    height: Option<String>,

    /// Foreground scale in percent (25-200).
    #[arg(long)]
    scale: Option<String>,

    /// Background type: `color` or `image`.
    #[arg(long)]
    background: Option<String>,

    /// Background color, `#rrggbb`.
    #[arg(long)]
    bg_color: Option<String>,

    /// Border width in pixels (0-50).
    #[arg(long)]
    border_width: Option<String>,

    /// Border color, `#rrggbb`.
    #[arg(long)]
    border_color: Option<String>,
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Image to place on the canvas.
    #[arg(long)]
    image: PathBuf,

    /// Directory the PNG is written to.
    #[arg(long)]
    out_dir: PathBuf,

    /// Print the draw calls of the composition to stdout.
    #[arg(long)]
    dump_ops: bool,

    #[command(flatten)]
    settings: SettingArgs,
}

#[derive(Args, Debug)]
struct PreviewArgs {
    /// Image to start with.
    #[arg(long)]
    image: Option<PathBuf>,

    /// Where the preview PNG is rewritten after every change.
    #[arg(long)]
    out: PathBuf,

    #[command(flatten)]
    settings: SettingArgs,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Preview(args) => cmd_preview(args),
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn build_form(args: &SettingArgs) -> anyhow::Result<SettingsForm> {
    let mut form = match &args.settings {
        Some(path) => {
            let (form, rejected) = SettingsForm::from_json_file(path)?;
            for (field, update) in rejected {
                report_update(field, update);
            }
            form
        }
        None => SettingsForm::new(),
    };
    let flags = [
        (SettingField::OutputWidth, &args.width),
        (SettingField::OutputHeight, &args.height),
        (SettingField::ScalePercent, &args.scale),
        (SettingField::BackgroundType, &args.background),
        (SettingField::BackgroundColor, &args.bg_color),
        (SettingField::BorderWidth, &args.border_width),
        (SettingField::BorderColor, &args.border_color),
    ];
    for (field, raw) in flags {
        if let Some(raw) = raw {
            report_update(field, form.apply(field, raw));
        }
    }
    Ok(form)
}

fn report_update(field: SettingField, update: FieldUpdate) {
    if let FieldUpdate::Rejected { reason, reset_to } = update {
        eprintln!("{field}: {reason}; reset to {reset_to}");
    }
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let settings = build_form(&args.settings)?.settings();

    let mut source = SourceSlot::new();
    source.load_file(&args.image)?;

    if args.dump_ops {
        let mut recorder = RecordingSurface::new();
        compose(&mut recorder, source.current_image(), &settings)?;
        let mut out = std::io::stdout().lock();
        for call in recorder.calls() {
            writeln!(out, "{call}")?;
        }
    }

    let exported = export_to_dir(&args.out_dir, &settings, &source)?;
    eprintln!(
        "wrote {} ({}x{})",
        exported.path.display(),
        exported.width,
        exported.height
    );
    Ok(())
}

fn cmd_preview(args: PreviewArgs) -> anyhow::Result<()> {
    let mut form = build_form(&args.settings)?;
    let mut source = SourceSlot::new();
    if let Some(path) = &args.image {
        source.load_file(path)?;
    }

    let mut preview = Preview::new(&form.settings())?;
    redraw(&mut preview, &form, &source, &args.out)?;

    let stdin = std::io::stdin().lock();
    for line in stdin.lines() {
        let line = line.context("read command from stdin")?;
        let mut words = line.split_whitespace();
        let Some(cmd) = words.next() else {
            continue;
        };
        let rest: Vec<&str> = words.collect();

        match (cmd, rest.as_slice()) {
            ("set", [field, value @ ..]) if !value.is_empty() => {
                let field: SettingField = match field.parse() {
                    Ok(f) => f,
                    Err(e) => {
                        println!("error: {e}");
                        continue;
                    }
                };
                report_update(field, form.apply(field, &value.join(" ")));
                redraw(&mut preview, &form, &source, &args.out)?;
            }
            ("load", [path]) => {
                if let Err(e) = source.load_file(Path::new(path)) {
                    println!("error: {e}");
                }
                redraw(&mut preview, &form, &source, &args.out)?;
            }
            ("show", []) => {
                println!("{}", serde_json::to_string_pretty(&form.settings())?);
            }
            ("export", [dir]) => match export_to_dir(Path::new(dir), &form.settings(), &source) {
                Ok(exported) => println!("exported {}", exported.path.display()),
                Err(e) => println!("error: {e}"),
            },
            ("quit" | "exit", []) => break,
            _ => println!(
                "commands: set <field> <value> | load <path> | show | export <dir> | quit"
            ),
        }
        std::io::stdout().flush()?;
    }
    Ok(())
}

fn redraw(
    preview: &mut Preview,
    form: &SettingsForm,
    source: &SourceSlot,
    out: &Path,
) -> anyhow::Result<()> {
    preview.refresh(&form.settings(), source)?;
    preview.snapshot_png(out)?;
    println!(
        "preview {}x{} -> {}",
        preview.surface().width(),
        preview.surface().height(),
        out.display()
    );
    Ok(())
}
