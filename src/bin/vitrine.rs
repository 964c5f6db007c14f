use std::{
    path::{Path, PathBuf},
    time::Instant,
};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand, ValueEnum};
use vitrine::{
    CatalogConfig, CatalogDriver, FileImageFetcher, HttpImageFetcher, ImageFetcher,
    LayoutVariant, PdfBackend, ProductRecord, Report,
};

#[derive(Parser, Debug)]
#[command(name = "vitrine", version, about = "Lay out product catalogs as PDF")]
struct Cli {
    /// More log output (repeat for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the decorated catalog of eligible products.
    Catalog(CatalogArgs),
    /// Render one plain page per product.
    Sheets(IoArgs),
    /// Render a single price table.
    PriceList(PriceListArgs),
}

#[derive(Args, Debug)]
struct IoArgs {
    /// Input product records JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output PDF path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Args, Debug)]
struct CatalogArgs {
    #[command(flatten)]
    io: IoArgs,

    /// Page layout.
    #[arg(long, value_enum, default_value_t = VariantChoice::Standard)]
    variant: VariantChoice,

    /// Catalog configuration JSON; built-in defaults when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding the default background images.
    #[arg(long)]
    assets: Option<PathBuf>,

    /// Document title written to the PDF info dictionary.
    #[arg(long)]
    title: Option<String>,
}

#[derive(Args, Debug)]
struct PriceListArgs {
    #[command(flatten)]
    io: IoArgs,

    /// Heading printed above the table.
    #[arg(long, default_value = "Planilha Teste")]
    title: String,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum VariantChoice {
    Standard,
    LargeFormat,
}

impl From<VariantChoice> for LayoutVariant {
    fn from(choice: VariantChoice) -> Self {
        match choice {
            VariantChoice::Standard => LayoutVariant::Standard,
            VariantChoice::LargeFormat => LayoutVariant::LargeFormat,
        }
    }
}

/// Fetches `http(s)://` references over the network and everything else from disk.
struct SourceFetcher {
    http: HttpImageFetcher,
    files: FileImageFetcher,
}

impl SourceFetcher {
    fn new() -> anyhow::Result<Self> {
        Ok(Self {
            http: HttpImageFetcher::new().context("build http client")?,
            files: FileImageFetcher::new(),
        })
    }
}

impl ImageFetcher for SourceFetcher {
    fn fetch(&self, url: &str) -> Option<Vec<u8>> {
        if url.starts_with("http://") || url.starts_with("https://") {
            self.http.fetch(url)
        } else {
            self.files.fetch(url)
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);
    match cli.cmd {
        Command::Catalog(args) => cmd_catalog(args),
        Command::Sheets(args) => cmd_sheets(args),
        Command::PriceList(args) => cmd_price_list(args),
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => tracing::Level::ERROR,
        (false, 0) => tracing::Level::INFO,
        (false, 1) => tracing::Level::DEBUG,
        (false, _) => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn read_records(path: &Path) -> anyhow::Result<Vec<ProductRecord>> {
    vitrine::load_records(path).with_context(|| format!("read records '{}'", path.display()))
}

fn create_output_dir(out: &Path) -> anyhow::Result<()> {
    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    Ok(())
}

fn report_written(out: &Path, started: Instant) -> anyhow::Result<()> {
    let inspected = vitrine::inspect_pdf_path(out)
        .with_context(|| format!("inspect written pdf '{}'", out.display()))?;
    eprintln!(
        "wrote {} ({} pages, {:.2}s)",
        out.display(),
        inspected.page_count,
        started.elapsed().as_secs_f64()
    );
    Ok(())
}

fn cmd_catalog(args: CatalogArgs) -> anyhow::Result<()> {
    let started = Instant::now();
    let records = read_records(&args.io.in_path)?;
    let config = match &args.config {
        Some(path) => CatalogConfig::load(path)
            .with_context(|| format!("load config '{}'", path.display()))?,
        None => CatalogConfig::default(),
    };

    let mut builder = CatalogDriver::builder()
        .config(config)
        .variant(args.variant.into());
    if let Some(root) = args.assets {
        builder = builder.asset_root(root);
    }
    if let Some(title) = args.title {
        builder = builder.document_title(title);
    }
    let driver = builder.build().context("invalid catalog configuration")?;

    let fetcher = SourceFetcher::new()?;
    create_output_dir(&args.io.out)?;
    driver
        .render_to_file(&records, &fetcher, &args.io.out)
        .with_context(|| format!("render catalog '{}'", args.io.out.display()))?;
    report_written(&args.io.out, started)
}

fn write_report(report: Report, out: &Path) -> anyhow::Result<()> {
    create_output_dir(out)?;
    let file =
        std::fs::File::create(out).with_context(|| format!("create '{}'", out.display()))?;
    let mut backend = PdfBackend::new(std::io::BufWriter::new(file));
    report
        .render(&mut backend)
        .with_context(|| format!("render '{}'", out.display()))?;
    Ok(())
}

fn cmd_sheets(args: IoArgs) -> anyhow::Result<()> {
    let started = Instant::now();
    let records = read_records(&args.in_path)?;
    let fetcher = SourceFetcher::new()?;
    write_report(vitrine::product_sheets(&records, &fetcher), &args.out)?;
    report_written(&args.out, started)
}

fn cmd_price_list(args: PriceListArgs) -> anyhow::Result<()> {
    let started = Instant::now();
    let records = read_records(&args.io.in_path)?;
    write_report(vitrine::price_list(&records, &args.title), &args.io.out)?;
    report_written(&args.io.out, started)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_list_title_defaults_to_planilha_teste() {
        let cli = Cli::try_parse_from(["vitrine", "price-list", "--in", "a.json", "--out", "b.pdf"])
            .unwrap();
        match cli.cmd {
            Command::PriceList(args) => {
                assert_eq!(args.title, "Planilha Teste");
                assert_eq!(args.io.in_path, PathBuf::from("a.json"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn catalog_accepts_large_format_variant() {
        let cli = Cli::try_parse_from([
            "vitrine", "catalog", "--in", "a.json", "--out", "b.pdf", "--variant", "large-format",
        ])
        .unwrap();
        let Command::Catalog(args) = cli.cmd else {
            panic!("expected catalog");
        };
        assert_eq!(LayoutVariant::from(args.variant), LayoutVariant::LargeFormat);
    }
}
