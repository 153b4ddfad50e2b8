// Command-line entry point for trace_graph.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use trace_graph::application::{GraphUsecase, TagValuesUsecase};
use trace_graph::config::GraphConfig;
use trace_graph::domain::identity::IdentityPolicy;
use trace_graph::domain::tag_values::{TagValuesQuery, TagValuesRequest, Timeframe, DEFAULT_PAGE_SIZE};
use trace_graph::infrastructure::concurrency::init_thread_pool;
use trace_graph::infrastructure::{JsonExporter, JsonSpanLoader, TreeLayoutEngine};
use trace_graph::ports::dot_exporter::DotExporter;
use trace_graph::ports::GraphExporter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the service graph of a span file
    Graph {
        /// Span file (JSON array, {"spans": [...]}, or JSON lines)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Json)]
        format: Format,

        /// Fail on spans without a resolvable service or system name
        #[arg(long)]
        strict: bool,
    },
    /// List tags, or count the values of one tag
    Tags {
        #[arg(short, long)]
        input: PathBuf,

        /// Tag to count; lists available tags when omitted
        #[arg(short, long)]
        tag: Option<String>,

        /// Keep values containing this substring
        #[arg(short, long)]
        search: Option<String>,

        #[arg(long, default_value_t = 0)]
        page: usize,

        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        page_size: usize,

        /// Timeframe start (unix ns)
        #[arg(long, requires = "end")]
        start: Option<u64>,

        /// Timeframe end (unix ns)
        #[arg(long, requires = "start")]
        end: Option<u64>,
    },
    /// Serve JSON-lines commands over TCP
    Serve {
        #[arg(short, long, default_value_t = 7878)]
        port: u16,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Json,
    Dot,
}

fn main() -> Result<()> {
    trace_graph::logging::init("trace_graph=info")?;

    let cli = Cli::parse();
    let mut config = GraphConfig::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Command::Graph {
            input,
            output,
            format,
            strict,
        } => {
            if strict {
                config.identity.policy = IdentityPolicy::Strict;
            }

            let exporter: Box<dyn GraphExporter> = match format {
                Format::Json => Box::new(JsonExporter::new(config.clone())),
                Format::Dot => Box::new(DotExporter::new(config.palette.clone())),
            };
            let layout = TreeLayoutEngine::new(&config.layout);

            let usecase = GraphUsecase {
                source: &JsonSpanLoader,
                layout: &layout,
                exporter: exporter.as_ref(),
                config: &config,
            };

            let summary = usecase.run(&input, &output)?;
            println!(
                "Graph completed! {} spans -> {} nodes, {} edges. Output written to {} (format: {:?})",
                summary.spans,
                summary.nodes,
                summary.edges,
                output.display(),
                format
            );
        }
        Command::Tags {
            input,
            tag,
            search,
            page,
            page_size,
            start,
            end,
        } => {
            init_thread_pool()?;
            let usecase = TagValuesUsecase {
                source: &JsonSpanLoader,
            };

            let output = match tag {
                None => serde_json::to_string_pretty(&usecase.available_tags(&input)?)?,
                Some(tag) => {
                    let timeframe = start
                        .zip(end)
                        .map(|(start_time, end_time)| Timeframe { start_time, end_time });
                    let query = TagValuesQuery {
                        tag,
                        query: TagValuesRequest { timeframe },
                        search,
                        page,
                        page_size,
                    };
                    serde_json::to_string_pretty(&usecase.values(&input, &query)?)?
                }
            };
            println!("{}", output);
        }
        Command::Serve { port } => {
            init_thread_pool()?;
            trace_graph::api::server::start_server(port, config)?;
        }
    }

    Ok(())
}
