use crate::case_list::SelectionMethod;
use crate::metrix::WikiMetrix;
use crate::pageviews::PageviewApi;
use crate::render::OutputFormat;
use crate::settings::Settings;
use anyhow::Result;
use clap::{ArgAction, Args, CommandFactory, Parser};
use std::path::PathBuf;
use tracing::info;

/// Collects page statistics for a set of Wikipedia articles
#[derive(Debug, Clone, Parser)]
#[command(name = "wikimetrix", version, disable_version_flag = true)]
pub struct Cli {
    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Language code of the wiki
    #[arg(short = 'L', long)]
    pub lang: Option<String>,

    /// Project family of the wiki, e.g. wikipedia or wikisource
    #[arg(short = 'S', long)]
    pub site: Option<String>,

    /// Column of the input file holding titles or Wikidata items
    #[arg(long)]
    pub column: Option<String>,

    /// Include articles from subcategories
    #[arg(long)]
    pub recurse: bool,

    /// Pageview service
    #[arg(long, value_enum)]
    pub pageviews: Option<PageviewApi>,

    /// Length of the pageview window in days
    #[arg(long)]
    pub days: Option<u32>,

    /// Settings file (defaults to wikimetrix.* in the working directory)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Write the report to this file instead of stdout
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Tsv)]
    pub format: OutputFormat,

    /// Do not show progress bars
    #[arg(long)]
    pub no_progress: bool,

    /// Print version
    #[arg(short = 'v', long, action = ArgAction::Version)]
    pub version: Option<bool>,
}

/// How the articles are selected; at most one of these may be given.
#[derive(Debug, Clone, Default, Args)]
#[group(required = false, multiple = false)]
pub struct SelectionArgs {
    /// An article and all its language versions
    #[arg(short = 'l', long, value_name = "ARTICLE")]
    pub langlinks: Option<String>,

    /// All articles in a category
    #[arg(short = 'c', long, value_name = "CATEGORY")]
    pub category: Option<String>,

    /// A tab-separated file with titles or Wikidata items
    #[arg(short = 'f', long, value_name = "FILE")]
    pub file: Option<String>,
}

impl SelectionArgs {
    pub fn selection(&self) -> Option<(SelectionMethod, &str)> {
        if let Some(article) = &self.langlinks {
            return Some((SelectionMethod::Langlinks, article));
        }
        if let Some(category) = &self.category {
            return Some((SelectionMethod::Category, category));
        }
        self.file
            .as_deref()
            .map(|file| (SelectionMethod::File, file))
    }
}

impl Cli {
    /// Command line flags win over the settings file and the environment
    pub fn apply_to(&self, settings: &mut Settings) {
        if let Some(lang) = &self.lang {
            settings.lang = lang.to_owned();
        }
        if let Some(site) = &self.site {
            settings.site = site.to_owned();
        }
        if let Some(column) = &self.column {
            settings.input_column = column.to_owned();
        }
        if self.recurse {
            settings.recurse_categories = true;
        }
        if let Some(api) = self.pageviews {
            settings.pageview_api = api;
        }
        if self.days.is_some() {
            settings.pageview_days = self.days;
        }
        if self.no_progress {
            settings.show_progress = false;
        }
    }
}

pub async fn run_command_line() -> Result<()> {
    let cli = Cli::parse();
    let (method, selection) = match cli.selection.selection() {
        Some(selection) => selection,
        None => {
            Cli::command().print_help()?;
            return Ok(());
        }
    };

    let mut settings = Settings::load(cli.config.as_deref())?;
    cli.apply_to(&mut settings);

    let metrix = WikiMetrix::new_from_settings(settings)?;
    let report = metrix.run(method.as_str(), selection).await?;
    let out = cli.format.renderer().render(&report)?;

    match &cli.output {
        Some(path) => {
            tokio::fs::write(path, out).await?;
            info!("Wrote {} rows to {}", report.rows().len(), path.display());
        }
        None => print!("{out}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("wikimetrix").chain(args.iter().copied()))
    }

    #[test]
    fn no_selection() {
        let cli = parse(&[]).unwrap();
        assert_eq!(cli.selection.selection(), None);
        assert_eq!(cli.format, OutputFormat::Tsv);
    }

    #[test]
    fn selection_flags() {
        let cli = parse(&["-c", "Writers"]).unwrap();
        assert_eq!(
            cli.selection.selection(),
            Some((SelectionMethod::Category, "Writers"))
        );
        let cli = parse(&["--langlinks", "Berlin", "-L", "de"]).unwrap();
        assert_eq!(
            cli.selection.selection(),
            Some((SelectionMethod::Langlinks, "Berlin"))
        );
        assert_eq!(cli.lang.as_deref(), Some("de"));
        let cli = parse(&["-f", "input.tsv", "--format", "json"]).unwrap();
        assert_eq!(
            cli.selection.selection(),
            Some((SelectionMethod::File, "input.tsv"))
        );
        assert_eq!(cli.format, OutputFormat::Json);
    }

    #[test]
    fn selection_flags_are_exclusive() {
        assert!(parse(&["-c", "Writers", "-l", "Berlin"]).is_err());
        assert!(parse(&["-f", "a.tsv", "-c", "Writers"]).is_err());
    }

    #[test]
    fn version_flag() {
        let err = parse(&["-v"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn flags_override_settings() {
        let cli = parse(&[
            "-c",
            "Writers",
            "-S",
            "wikisource",
            "--recurse",
            "--pageviews",
            "legacy",
            "--days",
            "30",
            "--column",
            "item",
            "--no-progress",
        ])
        .unwrap();
        let mut settings = Settings::default();
        cli.apply_to(&mut settings);
        assert_eq!(settings.lang, "en");
        assert_eq!(settings.site, "wikisource");
        assert_eq!(settings.input_column, "item");
        assert!(settings.recurse_categories);
        assert_eq!(settings.pageview_api, PageviewApi::Legacy);
        assert_eq!(settings.pageview_days(), 30);
        assert!(!settings.show_progress);
    }
}
