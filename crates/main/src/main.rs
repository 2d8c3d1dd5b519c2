use std::error::Error;
use std::fs;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use exam_paper::backend::{emit, TranscriptBackend};
use exam_paper::pdf::{render_pdf, PdfOptions};
use exam_paper::{
    assemble, Language, Layout, MarkTable, PageBudget, PaperConfig, Selection, Variant,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Assembles an exam paper from a JSON question selection.
///
/// Fonts are looked up under `assets/fonts` next to the binary or in the
/// directory named by `EXAM_PAPER_FONTS_DIR`, unless `--font-dir` is given.
#[derive(Parser)]
#[command(author, version, about = "Assemble printable exam papers")]
struct Cli {
    /// JSON file holding the selected questions.
    input: PathBuf,

    /// Which document to produce.
    #[arg(long, value_enum, default_value_t = VariantArg::Exam)]
    variant: VariantArg,

    /// Maximum number of questions per page; 0 means unlimited.
    #[arg(long, default_value_t = 10)]
    budget: usize,

    /// Subject name; math and science subjects group by mark value only.
    #[arg(long, default_value = "")]
    subject: String,

    /// Title printed at the top of every page.
    #[arg(long, default_value = "Examination")]
    title: String,

    /// Highest valid mark value; questions above it are left out.
    #[arg(long, default_value_t = 6)]
    max_marks: u32,

    /// Put every question in one flat list instead of sections.
    #[arg(long)]
    flat: bool,

    /// Language preferred for bilingual fields.
    #[arg(long, value_enum, default_value_t = LanguageArg::Secondary)]
    language: LanguageArg,

    /// Directory that relative image paths are resolved against.
    #[arg(long)]
    images: Option<PathBuf>,

    /// Widest a question image may be printed, in millimetres.
    #[arg(long, default_value_t = 120.0)]
    max_image_width: f64,

    /// Directory holding a custom font family (used with --font-family).
    #[arg(long, requires = "font_family")]
    font_dir: Option<PathBuf>,

    /// Name of the custom font family, e.g. `NotoSansGujarati`.
    #[arg(long, requires = "font_dir")]
    font_family: Option<String>,

    /// Where to write the result; defaults to `<variant>.pdf` or `<variant>.txt`.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write a plain-text transcript instead of a PDF.
    #[arg(long)]
    transcript: bool,

    /// Log debug output.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum VariantArg {
    Exam,
    ExamWithAnswer,
    Material,
}

impl From<VariantArg> for Variant {
    fn from(value: VariantArg) -> Self {
        match value {
            VariantArg::Exam => Variant::Exam,
            VariantArg::ExamWithAnswer => Variant::ExamWithAnswer,
            VariantArg::Material => Variant::Material,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum LanguageArg {
    Primary,
    Secondary,
}

impl From<LanguageArg> for Language {
    fn from(value: LanguageArg) -> Self {
        match value {
            LanguageArg::Primary => Language::Primary,
            LanguageArg::Secondary => Language::Secondary,
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let budget = if cli.budget == 0 {
        PageBudget::unbounded()
    } else {
        PageBudget::new(cli.budget)?
    };
    let layout = if cli.flat {
        Layout::Flat
    } else {
        Layout::SectionWise
    };

    let config = PaperConfig::new()
        .with_budget(budget)
        .with_mark_table(MarkTable::standard_up_to(cli.max_marks)?)
        .with_layout(layout)
        .with_language(cli.language.into())
        .with_subject(cli.subject)
        .with_title(cli.title);

    let selection = Selection::from_json(&fs::read_to_string(&cli.input)?)?;
    info!(
        "Loaded {} question(s) from {}",
        selection.len(),
        cli.input.display()
    );

    let variant = Variant::from(cli.variant);
    let document = assemble(&selection, &config, variant);
    info!(
        "Assembled {} with {} page(s), {} question(s), {} mark(s)",
        variant,
        document.pages().len(),
        document.question_count(),
        document.total_marks()
    );

    if cli.transcript {
        let output = cli
            .output
            .unwrap_or_else(|| PathBuf::from(format!("{variant}.txt")));
        let transcript = emit(&document, TranscriptBackend::new())?;
        fs::write(&output, transcript)?;
        println!("Generated {}", output.display());
        return Ok(());
    }

    let mut options = PdfOptions::new().with_max_image_width_mm(cli.max_image_width);
    if let Some(images) = cli.images {
        options = options.with_image_base_dir(images);
    }
    if let (Some(directory), Some(family)) = (cli.font_dir, cli.font_family) {
        options = options.with_font(directory, family);
    }

    let output = cli
        .output
        .unwrap_or_else(|| PathBuf::from(format!("{variant}.pdf")));
    let pdf = render_pdf(&document, options)?;
    pdf.save(&output)?;
    println!(
        "Generated {} ({} bytes, {} page(s))",
        output.display(),
        pdf.bytes.len(),
        pdf.pages
    );
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(err) = run(cli) {
        eprintln!("Error: {}", err);
        print_error_sources(err.as_ref());
        std::process::exit(1);
    }
}

fn print_error_sources(mut error: &(dyn Error + 'static)) {
    while let Some(source) = error.source() {
        eprintln!("  caused by: {}", source);
        error = source;
    }
}
