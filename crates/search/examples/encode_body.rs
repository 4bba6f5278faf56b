use std::fs::File;

use micro_search::codec::{BodyEncoder, CompressionLevel, ContentEncoding};
use micro_search::protocol::{BodyValue, SearchRequest};
use serde::Serialize;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Serialize)]
struct Query<'a> {
    index: &'a str,
    term: &'a str,
    size: u32,
}

fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::TRACE).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let encoder = BodyEncoder::builder().encoding(ContentEncoding::Zstd).level(CompressionLevel::Best).build();

    let mut request = match SearchRequest::new("POST", "http://127.0.0.1:9200/docs/_search") {
        Ok(request) => request,
        Err(e) => {
            error!(cause = %e, "build request error");
            return;
        }
    };

    let query = Query { index: "docs", term: "rust", size: 10 };
    match request.set_body_with(&encoder, BodyValue::json(&query)) {
        Ok(()) => info!(length = ?request.content_length(), headers = ?request.headers(), "json body encoded"),
        Err(e) => error!(cause = %e, "encode body error"),
    }

    // a file is released as soon as it has been compressed
    if let Some(path) = std::env::args().nth(1) {
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) => {
                error!(cause = %e, path, "open file error");
                return;
            }
        };

        match request.set_body(BodyValue::stream(file)) {
            Ok(()) => info!(path, length = ?request.content_length(), "file body encoded"),
            Err(e) => error!(cause = %e, path, "encode body error"),
        }
    }
}
