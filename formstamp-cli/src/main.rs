use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use formstamp::batch::{BatchOptions, FormBatch, FormTemplate, ProgressBar, TemplateKind, TemplateSet};
use formstamp::{fill_document, resolve_fields, Document, FieldHandle, FieldValues, Object};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "formstamp",
    about = "Fill PDF form templates from spreadsheet rows",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a worksheet and an assessment form for every player row
    Generate {
        /// Spreadsheet with one sheet per team (.xlsx, .xls, .ods)
        workbook: PathBuf,

        /// Directory holding both templates under their standard names
        #[arg(short, long, default_value = ".")]
        templates: PathBuf,

        /// Worksheet template (overrides --templates)
        #[arg(long)]
        worksheet: Option<PathBuf>,

        /// Assessment template (overrides --templates)
        #[arg(long)]
        assessment: Option<PathBuf>,

        /// Output zip archive
        #[arg(short, long, default_value = "Generated_Forms.zip")]
        output: PathBuf,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,

        /// Number of problems listed in the summary
        #[arg(long, default_value_t = 5)]
        preview: usize,
    },

    /// List the form fields of a PDF
    Fields {
        /// Input PDF file
        input: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Fill form fields of a single PDF
    Fill {
        /// Input PDF file
        input: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Field assignment, repeatable (e.g. --set name="Jane Doe")
        #[arg(short, long = "set", value_name = "NAME=VALUE", value_parser = parse_assignment)]
        values: Vec<(String, String)>,
    },
}

fn parse_assignment(arg: &str) -> std::result::Result<(String, String), String> {
    match arg.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected NAME=VALUE, got '{arg}'")),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "formstamp=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            workbook,
            templates,
            worksheet,
            assessment,
            output,
            json,
            preview,
        } => {
            let templates = load_templates(&templates, worksheet, assessment)?;
            let data = std::fs::read(&workbook)
                .with_context(|| format!("Failed to read workbook {}", workbook.display()))?;

            let bar = ProgressBar::default();
            let mut options = BatchOptions::default().with_preview_limit(preview);
            if !json {
                options = options.with_progress_callback(move |info| {
                    let mut stderr = std::io::stderr();
                    let _ = write!(stderr, "\r{}", bar.render(info));
                    let _ = stderr.flush();
                });
            }

            let mut batch = FormBatch::new(templates, options);
            let report = batch
                .run_bytes(&data)
                .with_context(|| format!("Failed to process {}", workbook.display()))?;
            if !json {
                eprintln!();
            }

            std::fs::write(&output, &report.archive)
                .with_context(|| format!("Failed to write {}", output.display()))?;

            let summary = &report.summary;
            if json {
                println!("{}", summary.to_json()?);
            } else {
                print!("{}", summary.format_report(preview));
                if summary.is_success() {
                    println!("\nAll forms generated successfully: {}", output.display());
                } else {
                    eprintln!(
                        "\nWarning: {} rows were skipped or failed; archive written to {}",
                        summary.failures.len(),
                        output.display()
                    );
                }
            }
        }

        Commands::Fields { input, json } => {
            let doc = Document::load_file(&input)
                .with_context(|| format!("Failed to open {}", input.display()))?;
            let fields = resolve_fields(&doc)
                .with_context(|| format!("Failed to read form of {}", input.display()))?;

            if json {
                let listing: Vec<_> = fields
                    .iter()
                    .map(|field| {
                        serde_json::json!({
                            "name": field.name(),
                            "kind": field.kind(),
                            "value": field_value(&doc, field),
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&listing)?);
            } else {
                println!("Form fields of: {}", input.display());
                println!("==========================================");
                for field in fields.iter() {
                    match field_value(&doc, field) {
                        Some(value) => println!("{field} = {value:?}"),
                        None => println!("{field}"),
                    }
                }
                println!("\n{} fields", fields.len());
            }
        }

        Commands::Fill {
            input,
            output,
            values,
        } => {
            if values.is_empty() {
                bail!("No values given; use --set NAME=VALUE");
            }
            let mut doc = Document::load_file(&input)
                .with_context(|| format!("Failed to open {}", input.display()))?;

            let values: FieldValues = values.into_iter().collect();
            let report = fill_document(&mut doc, &values)?;
            doc.save(&output)
                .with_context(|| format!("Failed to write {}", output.display()))?;

            for warning in &report.warnings {
                eprintln!("Warning: {warning}");
            }
            println!(
                "Filled {} of {} fields into {}",
                report.applied.len(),
                values.len(),
                output.display()
            );
        }
    }

    Ok(())
}

fn load_templates(
    dir: &Path,
    worksheet: Option<PathBuf>,
    assessment: Option<PathBuf>,
) -> Result<TemplateSet> {
    let open = |kind: TemplateKind, path: Option<PathBuf>| {
        let path = path.unwrap_or_else(|| dir.join(kind.file_name()));
        FormTemplate::open(kind, &path)
            .with_context(|| format!("Failed to load {kind} template {}", path.display()))
    };
    Ok(TemplateSet::new(
        open(TemplateKind::Worksheet, worksheet)?,
        open(TemplateKind::Assessment, assessment)?,
    ))
}

/// Current `/V` of a field as text
fn field_value(doc: &Document, field: &FieldHandle) -> Option<String> {
    let value = doc.get_dictionary(field.node().id)?.get("V")?;
    match doc.resolve(value) {
        Object::String(text) => Some(text.to_text()),
        Object::Name(name) => Some(name.clone()),
        _ => None,
    }
}
