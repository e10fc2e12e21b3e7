use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

const ROUTE_HELP: &str = "Execute an HTTP request. Supported HTTP methods are GET, POST and DELETE.

Routes can have any of the following formats:
  * http[s]://host[:port]/path   (use as is)
  * :port/path                   (assume http://localhost:port/path)
  * /path                        (assume http://localhost:80/path)

Headers are specified as a comma separated list of keypairs: --header name1(:|=)value1,name2(:|=)value2 ...
or specified multiple times: --header name1(:|=)value1 --header name2(:|=)value2";

#[derive(Parser, Debug)]
#[command(name = "httpreq", version, about = "httpreq <method> <route> [options]", long_about = ROUTE_HELP)]
pub struct Cli {
    /// Log request details to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Request timeout in seconds
    #[arg(long, global = true, env = "HTTPREQ_TIMEOUT", default_value_t = 10)]
    pub timeout: u64,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// HTTP GET request.
    Get(RequestArgs),
    /// HTTP POST request with a JSON body.
    #[command(long_about = "Make an HTTP POST request to the URL with a JSON body.
This command requires the --json flag, which should be a string conforming to valid JSON.")]
    Post(PostArgs),
    /// HTTP DELETE request.
    Delete(RequestArgs),
    /// Run requests declared in a JSON spec file, all of them or the given ids in order.
    Run(RunArgs),
}

#[derive(Args, Debug)]
pub struct RequestArgs {
    /// Target route
    pub url: String,

    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Args, Debug)]
pub struct PostArgs {
    /// Target route
    pub url: String,

    /// JSON body to use
    #[arg(long)]
    pub json: String,

    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Args, Debug, Default)]
pub struct CommonArgs {
    /// HTTP header to use in the request, as key=value or key:value.
    #[arg(long = "header", value_delimiter = ',')]
    pub headers: Vec<String>,

    /// Output the response body to the filename.
    #[arg(long)]
    pub output_file: Option<PathBuf>,

    /// Use AWS signature V4 as authentication in the request. Requires the --aws-region option.
    #[arg(long = "aws-sigv4")]
    pub aws_sigv4: bool,

    /// The AWS region to use in the AWS signature.
    #[arg(long, default_value = "")]
    pub aws_region: String,

    /// The name of an AWS profile in your AWS configuration. If not specified, environment variables are used.
    #[arg(long, default_value = "")]
    pub aws_profile: String,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to the spec file
    pub spec: PathBuf,

    /// Request ids to run, in order. Runs every request when omitted.
    pub ids: Vec<String>,

    /// Rewrite the base URL of every request
    #[arg(long)]
    pub base_url: Option<String>,

    /// Output the last response body to the filename.
    #[arg(long)]
    pub output_file: Option<PathBuf>,
}
