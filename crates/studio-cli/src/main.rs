use std::env;
use std::fs;
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use studio_contracts::catalog::{
    find_product, AspectRatio, Resolution, EDIT_SUGGESTIONS, PRODUCT_TEMPLATES,
};
use studio_contracts::events::{EventWriter, EVENTS_FILE};
use studio_contracts::history::{save_record_image, GeneratedImageRecord};
use studio_contracts::models::ModelSelector;
use studio_contracts::session::{parse_session_command, SESSION_HELP_COMMANDS};
use studio_engine::gemini::API_KEY_VARS;
use studio_engine::{
    load_image_file, AdapterModels, CredentialHost, GenerationAdapter, Studio, StudioMode,
    SubmitOutcome, Workflow,
};

const DRYRUN_MODEL: &str = "dryrun-image-1";

#[derive(Debug, Parser)]
#[command(
    name = "mockup-studio",
    version,
    about = "Logo mockups, instruction edits and pro renders on Gemini image models"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Place a logo on a catalog product.
    Mockup(MockupArgs),
    /// Apply one or more instructions to an image, each on the previous result.
    Edit(EditArgs),
    /// Text-to-image on the pro model.
    Pro(ProArgs),
    /// List the product catalog.
    Products,
    /// Interactive session with slash commands.
    Session(SessionArgs),
}

#[derive(Debug, Args)]
struct StudioArgs {
    #[arg(long)]
    out: PathBuf,
    #[arg(long)]
    events: Option<PathBuf>,
    /// Use the offline placeholder model instead of calling Gemini.
    #[arg(long)]
    dryrun: bool,
    /// Model for mockups and edits.
    #[arg(long)]
    model: Option<String>,
    #[arg(long)]
    pro_model: Option<String>,
}

#[derive(Debug, Parser)]
struct MockupArgs {
    #[arg(long)]
    logo: PathBuf,
    #[arg(long, default_value = "t-shirt")]
    product: String,
    #[arg(long)]
    prompt: Option<String>,
    #[command(flatten)]
    studio: StudioArgs,
}

#[derive(Debug, Parser)]
struct EditArgs {
    #[arg(long)]
    image: PathBuf,
    #[arg(long = "instruction", required = true)]
    instructions: Vec<String>,
    #[command(flatten)]
    studio: StudioArgs,
}

#[derive(Debug, Parser)]
struct ProArgs {
    #[arg(long)]
    prompt: String,
    #[arg(long, default_value = "1K")]
    size: String,
    #[arg(long, default_value = "1:1")]
    aspect_ratio: String,
    #[command(flatten)]
    studio: StudioArgs,
}

#[derive(Debug, Parser)]
struct SessionArgs {
    #[command(flatten)]
    studio: StudioArgs,
}

fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("mockup-studio error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Mockup(args) => run_mockup(args),
        Command::Edit(args) => run_edit(args),
        Command::Pro(args) => run_pro(args),
        Command::Products => {
            print_products();
            Ok(0)
        }
        Command::Session(args) => {
            run_session(args)?;
            Ok(0)
        }
    }
}

fn build_studio(args: &StudioArgs, host: Option<TerminalCredentialHost>) -> Result<Studio> {
    let dryrun = args.dryrun.then_some(DRYRUN_MODEL);
    let standard = args.model.as_deref().or(dryrun);
    let pro = args.pro_model.as_deref().or(dryrun);
    let (models, notes) = AdapterModels::resolve(&ModelSelector::default(), standard, pro)?;
    for note in notes {
        println!("{note}");
    }

    let mut adapter = GenerationAdapter::with_default_services(models)?;
    if let Some(host) = host {
        adapter = adapter.with_credential_host(host);
    }

    fs::create_dir_all(&args.out)
        .with_context(|| format!("failed to create {}", args.out.display()))?;
    let events_path = args
        .events
        .clone()
        .unwrap_or_else(|| args.out.join(EVENTS_FILE));
    Studio::new(adapter).with_event_log(EventWriter::for_new_session(events_path))
}

fn run_mockup(args: MockupArgs) -> Result<i32> {
    let product = find_product(&args.product).ok_or_else(|| {
        anyhow!(
            "unknown product '{}' (expected one of {})",
            args.product,
            product_ids().join(", ")
        )
    })?;
    let logo = load_image_file(&args.logo)?;

    let mut studio = build_studio(&args.studio, None)?;
    let mockup = studio.mockup_mut();
    mockup.set_logo(logo);
    mockup.set_product(product);
    if let Some(prompt) = &args.prompt {
        mockup.set_custom_prompt(prompt.as_str());
    }
    let outcome = studio.submit_mockup()?;
    let ok = report_outcome(&outcome, &args.studio.out)?;
    finish_run(&studio, &args.studio.out, ok)
}

fn run_edit(args: EditArgs) -> Result<i32> {
    let image = load_image_file(&args.image)?;
    let mut studio = build_studio(&args.studio, None)?;
    studio.edit_existing_image(image)?;

    let mut ok = true;
    for instruction in &args.instructions {
        studio.edit_mut().set_instruction(instruction.as_str());
        let outcome = studio.submit_edit()?;
        if !report_outcome(&outcome, &args.studio.out)? {
            ok = false;
            break;
        }
    }
    finish_run(&studio, &args.studio.out, ok)
}

fn run_pro(args: ProArgs) -> Result<i32> {
    let resolution = args.size.parse::<Resolution>().map_err(anyhow::Error::msg)?;
    let aspect_ratio = args
        .aspect_ratio
        .parse::<AspectRatio>()
        .map_err(anyhow::Error::msg)?;

    let mut studio = build_studio(&args.studio, None)?;
    studio.switch_to(StudioMode::Pro)?;
    let pro = studio.pro_mut();
    pro.set_prompt(args.prompt.as_str());
    pro.set_resolution(resolution);
    pro.set_aspect_ratio(aspect_ratio);
    let outcome = studio.submit_pro()?;
    let ok = report_outcome(&outcome, &args.studio.out)?;
    finish_run(&studio, &args.studio.out, ok)
}

fn finish_run(studio: &Studio, out: &Path, ok: bool) -> Result<i32> {
    let manifest = studio.save_history(out)?;
    println!("History written to {}", manifest.display());
    Ok(if ok { 0 } else { 1 })
}

/// Prints the outcome, saving a generated image into `out`. Returns whether
/// the submit produced an image.
fn report_outcome(outcome: &SubmitOutcome, out: &Path) -> Result<bool> {
    match outcome {
        SubmitOutcome::Generated(record) => {
            let path = save_record_image(record, out)?;
            println!("{} -> {}", format_record(record), path.display());
            Ok(true)
        }
        SubmitOutcome::Failed(error) => {
            eprintln!("{}", error.message());
            if let Some(detail) = error.detail() {
                eprintln!("  {detail}");
            }
            Ok(false)
        }
        SubmitOutcome::Skipped(skip) => {
            println!("Skipped: {}", skip.message());
            Ok(false)
        }
    }
}

fn format_record(record: &GeneratedImageRecord) -> String {
    format!(
        "[{}] {} {} \"{}\"",
        record.kind(),
        record.id(),
        record.created_at().format("%H:%M:%S"),
        record.prompt()
    )
}

fn product_ids() -> Vec<&'static str> {
    PRODUCT_TEMPLATES.iter().map(|product| product.id).collect()
}

fn print_products() {
    for product in PRODUCT_TEMPLATES {
        println!("{:<8} {:<14} {}", product.id, product.display_name, product.prompt_fragment);
    }
}

fn run_session(args: SessionArgs) -> Result<()> {
    let out = args.studio.out.clone();
    let mut studio = build_studio(&args.studio, Some(TerminalCredentialHost))?;

    let stdin = io::stdin();
    let mut line = String::new();
    println!("Mockup studio started in {} mode. Type /help for commands.", studio.mode());

    loop {
        print!("{}> ", studio.mode());
        io::stdout().flush()?;

        line.clear();
        let read = match stdin.read_line(&mut line) {
            Ok(read) => read,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        };
        if read == 0 {
            break;
        }

        let input = line.trim_end_matches(['\n', '\r']);
        let command = parse_session_command(input);
        match command.action.as_str() {
            "noop" => {}
            "help" => {
                println!("Commands: {}", SESSION_HELP_COMMANDS.join(" "));
                println!("Plain text sets the current mode's prompt and generates.");
            }
            "quit" => break,
            "set_mode" => match command.arg("mode").map(str::parse::<StudioMode>) {
                Some(Ok(mode)) => {
                    studio.switch_to(mode)?;
                    println!("Mode: {mode}");
                }
                Some(Err(message)) => println!("{message}"),
                None => println!("Mode: {} (use /mode <mockup|edit|pro>)", studio.mode()),
            },
            "set_logo" => match command.arg("path") {
                Some(path) => match load_image_file(Path::new(path)) {
                    Ok(logo) => {
                        studio.mockup_mut().set_logo(logo);
                        println!("Logo set to {path}");
                    }
                    Err(err) => println!("Logo load failed: {err:#}"),
                },
                None => println!("/logo requires a path"),
            },
            "set_image" => match command.arg("path") {
                Some(path) => match load_image_file(Path::new(path)) {
                    Ok(image) => {
                        studio.edit_mut().set_image(image);
                        println!("Image to edit set to {path}");
                    }
                    Err(err) => println!("Image load failed: {err:#}"),
                },
                None => println!("/image requires a path"),
            },
            "set_product" => match command.arg("product").and_then(find_product) {
                Some(product) => {
                    studio.mockup_mut().set_product(product);
                    println!("Product: {}", product.display_name);
                }
                None => println!("Products: {}", product_ids().join(", ")),
            },
            "list_products" => print_products(),
            "set_resolution" => match command.arg("resolution").map(str::parse::<Resolution>) {
                Some(Ok(resolution)) => {
                    studio.pro_mut().set_resolution(resolution);
                    println!("Resolution: {resolution}");
                }
                Some(Err(message)) => println!("{message}"),
                None => println!("Resolution: {}", studio.pro().resolution()),
            },
            "set_aspect_ratio" => {
                match command.arg("aspect_ratio").map(str::parse::<AspectRatio>) {
                    Some(Ok(aspect_ratio)) => {
                        studio.pro_mut().set_aspect_ratio(aspect_ratio);
                        println!("Aspect ratio: {aspect_ratio}");
                    }
                    Some(Err(message)) => println!("{message}"),
                    None => println!("Aspect ratio: {}", studio.pro().aspect_ratio()),
                }
            }
            "prompt" => {
                let text = command.text.clone().unwrap_or_default();
                apply_prompt_text(&mut studio, &text);
                let outcome = studio.submit_current()?;
                report_outcome(&outcome, &out)?;
            }
            "generate" => {
                let outcome = studio.submit_current()?;
                report_outcome(&outcome, &out)?;
            }
            "edit_last" => match studio.history().latest().map(|record| record.id().to_string()) {
                Some(id) => {
                    studio.edit_record(&id)?;
                    println!("Editing {id}");
                }
                None => println!("History is empty."),
            },
            "edit_record" => match command.arg("id") {
                Some(id) => match studio.edit_record(id) {
                    Ok(()) => println!("Editing {id}"),
                    Err(err) => println!("{err:#}"),
                },
                None => println!("/edit requires a history id (see /history)"),
            },
            "history" => {
                if studio.history().is_empty() {
                    println!("History is empty.");
                }
                for record in studio.history().recent() {
                    println!("{}", format_record(record));
                }
            }
            "save_history" => {
                let dir = command.arg("path").map(PathBuf::from).unwrap_or_else(|| out.clone());
                match studio.save_history(&dir) {
                    Ok(manifest) => println!("History written to {}", manifest.display()),
                    Err(err) => println!("Save failed: {err:#}"),
                }
            }
            "suggest" => {
                for (index, suggestion) in EDIT_SUGGESTIONS.iter().enumerate() {
                    println!("{}. {suggestion}", index + 1);
                }
            }
            "reset" => {
                let mode = studio.mode();
                studio.workflow_mut(mode).reset();
                println!("{mode} form cleared");
            }
            "unknown" => {
                let name = command.arg("command").unwrap_or_default();
                println!("Unknown command: /{name}. Type /help for commands.");
            }
            other => bail!("unhandled session action '{other}'"),
        }
    }

    if !studio.history().is_empty() {
        let manifest = studio.save_history(&out)?;
        println!("History written to {}", manifest.display());
    }
    Ok(())
}

/// Puts free text into the current mode's form: the mockup's custom prompt,
/// the edit instruction or the pro prompt.
fn apply_prompt_text(studio: &mut Studio, text: &str) {
    match studio.mode() {
        StudioMode::Mockup => studio.mockup_mut().set_custom_prompt(text),
        StudioMode::Edit => studio.edit_mut().set_instruction(text),
        StudioMode::Pro => studio.pro_mut().set_prompt(text),
    }
}

/// Checks the API-key variables and, when none is set, asks for a key on the
/// terminal.
struct TerminalCredentialHost;

impl CredentialHost for TerminalCredentialHost {
    fn has_selected_credential(&self) -> bool {
        API_KEY_VARS.iter().any(|key| {
            env::var(key)
                .map(|value| !value.trim().is_empty())
                .unwrap_or(false)
        })
    }

    fn open_credential_selection(&self) {
        print!("No Gemini API key found. Paste a key (blank to skip): ");
        let _ = io::stdout().flush();
        let mut key = String::new();
        if io::stdin().read_line(&mut key).is_err() {
            return;
        }
        let key = key.trim();
        if !key.is_empty() {
            env::set_var("GEMINI_API_KEY", key);
        }
    }
}
