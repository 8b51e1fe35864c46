use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use legaldoc_pdf::{
    DocumentGenerator, Error, LayoutStyle, StaticTextService, TemplateDescriptor, TemplateRegistry,
};

#[derive(Parser)]
#[command(name = "legaldoc-pdf", version)]
#[command(about = "Compose generated legal agreements into paginated PDF documents")]
struct Cli {
    /// Increase log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the built-in templates
    Templates,

    /// Show the fields a template requires
    Fields {
        /// Template id, e.g. NDA
        id: String,
    },

    /// Lay out an agreement text and write it as PDF
    Render {
        #[arg(long)]
        template: String,
        /// JSON object mapping field keys to values
        #[arg(long)]
        fields: Option<PathBuf>,
        /// Single field as key=value; may be repeated and overrides --fields
        #[arg(short = 'f', long = "field", value_name = "KEY=VALUE")]
        field: Vec<String>,
        /// Agreement text produced by the generator
        #[arg(long)]
        text: PathBuf,
        #[arg(long, default_value = ".")]
        out: PathBuf,
        /// Layout style overrides as JSON
        #[arg(long)]
        style: Option<PathBuf>,
        /// Effective date printed on the cover when no field provides one
        #[arg(long)]
        date: Option<String>,
        /// Also write the plain text export
        #[arg(long)]
        txt: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run(command: Command) -> Result<(), Error> {
    match command {
        Command::Templates => {
            for t in TemplateRegistry::builtin().list_templates() {
                println!("{:<12} {}", t.id, t.display_name);
            }
            Ok(())
        }
        Command::Fields { id } => {
            let registry = TemplateRegistry::builtin();
            for f in registry.fields_for(&id)? {
                println!("{:<18} {:<20} {:?}  ({})", f.key, f.label, f.kind, f.placeholder);
            }
            Ok(())
        }
        Command::Render {
            template,
            fields,
            field,
            text,
            out,
            style,
            date,
            txt,
        } => {
            let style = match style {
                Some(path) => LayoutStyle::from_json_file(&path)?,
                None => LayoutStyle::default(),
            };
            let text = std::fs::read_to_string(&text)?;
            let mut generator =
                DocumentGenerator::new(TemplateRegistry::builtin(), StaticTextService::new(text), style);
            if let Some(date) = date {
                generator = generator.with_effective_date(date);
            }
            let pairs = collect_fields(generator.registry().template(&template)?, fields.as_deref(), &field)?;

            let handle = generator.generate(&template, &pairs)?;
            std::fs::create_dir_all(&out)?;
            let pdf = generator.write_pdf(handle, &out)?;
            println!("{}", pdf.display());
            if txt {
                let path = generator.write_text(handle, &out)?;
                println!("{}", path.display());
            }
            Ok(())
        }
    }
}

/// Merge the JSON field file and `key=value` flags, ordered as the template
/// lists its fields so parties keep their natural order on the cover.
fn collect_fields(
    template: &TemplateDescriptor,
    file: Option<&std::path::Path>,
    flags: &[String],
) -> Result<Vec<(String, String)>, Error> {
    let mut values: Vec<(String, String)> = Vec::new();
    let mut set = |key: String, value: String| match values.iter_mut().find(|(k, _)| *k == key) {
        Some(slot) => slot.1 = value,
        None => values.push((key, value)),
    };

    if let Some(path) = file {
        let json = std::fs::read_to_string(path)?;
        let map: serde_json::Map<String, serde_json::Value> =
            serde_json::from_str(&json).map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        for (key, value) in map {
            let value = match value {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            set(key, value);
        }
    }
    for flag in flags {
        let Some((key, value)) = flag.split_once('=') else {
            return Err(Error::Config(format!("expected KEY=VALUE, got '{flag}'")));
        };
        set(key.trim().to_string(), value.to_string());
    }

    let rank = |key: &str| {
        template
            .fields
            .iter()
            .position(|f| f.key == key)
            .unwrap_or(usize::MAX)
    };
    values.sort_by_key(|(k, _)| rank(k));
    Ok(values)
}
