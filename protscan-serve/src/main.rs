//! Serve the protscan pipeline over HTTP: `POST /api/analyze` and the web page at `/`.
use std::{io::Read, path::PathBuf, time::Duration};

use clap::Parser;
use log::{error, info, warn};
use protscan::{Endpoints, Pipeline};
use tiny_http::{Header, Response, Server};

mod handler;

#[derive(Debug, Parser)]
#[clap(version, about)]
struct Cli {
    #[clap(long, env = "PROTSCAN_HOST", default_value = "0.0.0.0", help = "Address to listen on")]
    host: String,
    #[clap(long, env = "PROTSCAN_PORT", default_value_t = 8080, help = "Port to listen on")]
    port: u16,
    #[clap(long, default_value_t = 30, help = "Timeout in seconds for every upstream request")]
    timeout: u64,
    #[clap(long, help = "Serve `webapp.html` from this directory instead of the built-in page")]
    static_dir: Option<PathBuf>,
    #[clap(long, help = "Directory for temporary structure files")]
    scratch_dir: Option<PathBuf>,
    #[clap(long, help = "JSON file overriding the upstream URLs")]
    endpoints: Option<PathBuf>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let endpoints = match cli.endpoints.as_deref().map(Endpoints::from_path) {
        None => Endpoints::default(),
        Some(Ok(endpoints)) => endpoints,
        Some(Err(e)) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };
    let pipeline = match Pipeline::http(Duration::from_secs(cli.timeout), endpoints) {
        Ok(pipeline) => pipeline.with_scratch_dir(cli.scratch_dir),
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };
    let server = match Server::http((cli.host.as_str(), cli.port)) {
        Ok(server) => server,
        Err(e) => {
            eprintln!("Could not listen on {}:{}: {e}", cli.host, cli.port);
            std::process::exit(1);
        }
    };
    info!("Listening on http://{}:{}", cli.host, cli.port);

    for mut request in server.incoming_requests() {
        let mut body = String::new();
        let read = request
            .as_reader()
            .read_to_string(&mut body)
            .map_err(|e| e.to_string());
        let reply = handler::handle(
            request.method().as_str(),
            request.url(),
            read.as_ref().map(|_| body.as_str()).map_err(String::as_str),
            &pipeline,
            cli.static_dir.as_deref(),
        );
        info!("{} {} {}", request.method(), request.url(), reply.status);

        let mut response = Response::from_string(reply.body).with_status_code(reply.status);
        for (name, value) in reply.headers {
            match Header::from_bytes(name.as_bytes(), value.as_bytes()) {
                Ok(header) => response.add_header(header),
                Err(()) => warn!("Invalid header {name}: {value}"),
            }
        }
        if let Err(e) = request.respond(response) {
            error!("Could not send response: {e}");
        }
    }
}
