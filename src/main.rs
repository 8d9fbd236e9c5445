//! Segue - command-line page fetch check
//!
//! Fetches pages the way a controller would and reports what it would
//! display: `segue <url> <container-id> [<url>...]`

use segue::network::{Fetcher, NetworkClient, PageCache, Request};
use segue::{NAME, VERSION};
use std::env;
use std::process::ExitCode;
use std::sync::Arc;

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    let (url, container_id, rest) = match args.as_slice() {
        [url, id, rest @ ..] => (url, id, rest),
        _ => {
            eprintln!("{} v{}", NAME, VERSION);
            eprintln!("usage: segue <url> <container-id> [<url>...]");
            return ExitCode::FAILURE;
        }
    };

    let client = match NetworkClient::new() {
        Ok(client) => client,
        Err(e) => {
            eprintln!("could not create HTTP client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let requests: Vec<Request> = std::iter::once(url)
        .chain(rest)
        .map(|u| Request::get(u.as_str()))
        .collect();
    let cache = PageCache::new(requests.len());
    let fetcher = Fetcher::new(cache.clone(), Arc::new(client), container_id.as_str());
    let statuses = fetcher.fetch_all(&requests).await;

    let mut ok = true;
    for (request, status) in requests.iter().zip(statuses) {
        match cache.page(request.url()) {
            Some(page) => match page.fragment() {
                Some(fragment) => println!(
                    "{}\n  title: {:?}\n  #{}: {} bytes",
                    request.url(),
                    page.title(),
                    container_id,
                    fragment.html().len()
                ),
                None => {
                    ok = false;
                    println!("{}\n  title: {:?}\n  #{}: missing", request.url(), page.title(), container_id);
                }
            },
            None => {
                ok = false;
                println!("{}\n  failed ({:?})", request.url(), status);
            }
        }
    }

    if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}
