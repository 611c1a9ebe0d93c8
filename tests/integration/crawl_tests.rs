//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end, from seed URL to files on disk.

use site_scribe::config::{build_job, Config, CrawlJob, JobOverrides, OutputFormat};
use site_scribe::crawler::{run_crawl, CrawlSummary};
use site_scribe::output::Checkpoint;
use site_scribe::progress::CrawlEvent;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use tokio::sync::mpsc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Configuration with short delays and no default exclude patterns
fn test_config() -> Config {
    let mut config = Config::default();
    config.crawler.initial_delay = 10;
    config.crawler.max_delay = 200;
    config.crawler.timeout = 5_000;
    config.crawler.exclude_patterns = Vec::new();
    config
}

fn test_job(server: &MockServer, out: &Path, config: Config, overrides: JobOverrides) -> CrawlJob {
    let overrides = JobOverrides {
        output_dir: Some(out.to_path_buf()),
        ..overrides
    };
    build_job(&format!("{}/", server.uri()), config, overrides).expect("valid job")
}

fn html_page(title: &str, body: &str) -> String {
    format!(
        "<html><head><title>{}</title></head><body><main>{}</main></body></html>",
        title, body
    )
}

/// Mounts an HTML page at `route`
async fn mount_page(server: &MockServer, route: &str, title: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(html_page(title, body), "text/html"))
        .mount(server)
        .await;
}

/// Runs a crawl and collects every event it published
async fn crawl(job: CrawlJob) -> (CrawlSummary, Vec<CrawlEvent>) {
    let (tx, mut rx) = mpsc::channel(1024);
    let summary = run_crawl(job, Some(tx)).await.expect("crawl succeeds");

    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    (summary, events)
}

fn progress_values(events: &[CrawlEvent]) -> Vec<u8> {
    events
        .iter()
        .filter_map(|event| match event {
            CrawlEvent::Progress(progress) => Some(progress.progress),
            _ => None,
        })
        .collect()
}

fn page_files(out: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(out.join("pages"))
        .expect("pages dir")
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

fn load_checkpoint(out: &Path) -> Checkpoint {
    Checkpoint::load(&out.join("state.json"))
        .expect("readable checkpoint")
        .expect("checkpoint exists")
}

#[tokio::test]
async fn test_three_page_crawl() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        "Home",
        r#"<p>Welcome</p><p><a href="/one">One</a> <a href="/two">Two</a></p>"#,
    )
    .await;
    let one = r#"<p>First <a href="/two">next</a> <a href="/">home</a></p>"#;
    mount_page(&server, "/one", "One", one).await;
    mount_page(&server, "/two", "Two", "<p>Second page</p>").await;

    let dir = TempDir::new().unwrap();
    let overrides = JobOverrides {
        max_pages: Some(10),
        concurrency: Some(2),
        format: Some(OutputFormat::Markdown),
        ..Default::default()
    };
    let job = test_job(&server, dir.path(), test_config(), overrides);

    let (summary, events) = crawl(job).await;

    assert_eq!(summary.successful_pages, 3);
    assert_eq!(summary.failed_pages, 0);
    assert_eq!(page_files(dir.path()), vec!["index.md", "one.md", "two.md"]);

    let index = fs::read_to_string(dir.path().join("pages/index.md")).unwrap();
    assert!(index.starts_with("# Home\n"));
    assert!(index.contains("Welcome"));

    let sitemap = fs::read_to_string(dir.path().join("sitemap.md")).unwrap();
    assert!(sitemap.contains("## Pages (3)"));
    assert!(sitemap.contains("`two.md`"));

    let checkpoint = load_checkpoint(dir.path());
    assert_eq!(checkpoint.successful_pages, 3);
    assert_eq!(checkpoint.sitemap.len(), 3);
    assert_eq!(checkpoint.visited.len(), 3);
    assert!(checkpoint.to_visit.is_empty());

    let progress = progress_values(&events);
    assert_eq!(progress.last(), Some(&100));
    assert!(progress.windows(2).all(|w| w[0] <= w[1]));
    assert!(events.iter().any(|e| matches!(e, CrawlEvent::Completed(_))));
}

#[tokio::test]
async fn test_rate_limited_then_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    mount_page(&server, "/", "Home", "<p>Eventually served</p>").await;

    let dir = TempDir::new().unwrap();
    let mut config = test_config();
    config.crawler.max_retries = 3;
    let job = test_job(&server, dir.path(), config, JobOverrides::default());

    let (summary, _) = crawl(job).await;

    assert_eq!(summary.successful_pages, 1);
    assert_eq!(summary.failed_pages, 0);
    assert_eq!(summary.backoff.increases, 2);

    let checkpoint = load_checkpoint(dir.path());
    assert_eq!(checkpoint.sitemap.len(), 1);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.iter().filter(|r| r.url.path() == "/").count(), 3);
}

#[tokio::test]
async fn test_not_found_is_permanent() {
    let server = MockServer::start().await;
    mount_page(&server, "/", "Home", r#"<p><a href="/missing">gone</a></p>"#).await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let job = test_job(&server, dir.path(), test_config(), JobOverrides::default());

    let (summary, _) = crawl(job).await;

    assert_eq!(summary.successful_pages, 1);
    assert_eq!(summary.failed_pages, 1);
    assert!(summary.failures[0].url.ends_with("/missing"));
    assert_eq!(summary.failures[0].error, "HTTP 404");

    let sitemap = fs::read_to_string(dir.path().join("sitemap.md")).unwrap();
    assert!(sitemap.contains("## Failed Pages (1)"));
}

#[tokio::test]
async fn test_exclude_patterns_respected() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        "Home",
        r#"<p><a href="/private/secret">secret</a> <a href="/public">public</a></p>"#,
    )
    .await;
    mount_page(&server, "/public", "Public", "<p>Open</p>").await;
    Mock::given(method("GET"))
        .and(path("/private/secret"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = test_config();
    config.crawler.exclude_patterns = vec!["/private/".to_string()];
    let job = test_job(&server, dir.path(), config, JobOverrides::default());

    let (summary, _) = crawl(job).await;

    assert_eq!(summary.successful_pages, 2);
    assert_eq!(page_files(dir.path()), vec!["index.md", "public.md"]);
}

#[tokio::test]
async fn test_page_cap_honoured() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        "Home",
        r#"<p><a href="/a">a</a> <a href="/b">b</a> <a href="/c">c</a></p>"#,
    )
    .await;
    for route in ["/a", "/b", "/c"] {
        mount_page(&server, route, route, "<p>leaf</p>").await;
    }

    let dir = TempDir::new().unwrap();
    let overrides = JobOverrides {
        max_pages: Some(2),
        ..Default::default()
    };
    let job = test_job(&server, dir.path(), test_config(), overrides);

    let (summary, _) = crawl(job).await;

    assert_eq!(summary.successful_pages, 2);
    assert!(summary.discovered_urls <= 2);
    assert_eq!(page_files(dir.path()), vec!["a.md", "index.md"]);
}

#[tokio::test]
async fn test_resume_skips_visited() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(html_page("Home", "<p>x</p>"), "text/html"),
        )
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/next"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(
                html_page("Next", r#"<p>Next <a href="/">home</a></p>"#),
                "text/html",
            ),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let seed = format!("{}/", server.uri());
    let checkpoint = Checkpoint {
        visited: vec![seed.clone()],
        to_visit: vec![format!("{}/next", server.uri())],
        successful_pages: 1,
        unique_urls_discovered: vec![seed],
        ..Default::default()
    };
    checkpoint.save(&dir.path().join("state.json")).unwrap();

    let job = test_job(&server, dir.path(), test_config(), JobOverrides::default());
    let (summary, _) = crawl(job).await;

    assert_eq!(summary.successful_pages, 2);
    assert_eq!(page_files(dir.path()), vec!["next.md"]);

    let checkpoint = load_checkpoint(dir.path());
    assert_eq!(checkpoint.visited.len(), 2);
}

#[tokio::test]
async fn test_webhook_fired_once() {
    let server = MockServer::start().await;
    mount_page(&server, "/", "Home", "<p>Only page</p>").await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let overrides = JobOverrides {
        webhook: Some(format!("{}/hook", server.uri())),
        ..Default::default()
    };
    let job = test_job(&server, dir.path(), test_config(), overrides);

    let (summary, _) = crawl(job).await;
    assert_eq!(summary.successful_pages, 1);

    let requests = server.received_requests().await.unwrap();
    let hook = requests
        .iter()
        .find(|r| r.url.path() == "/hook")
        .expect("webhook request");
    let body: serde_json::Value = serde_json::from_slice(&hook.body).unwrap();
    assert_eq!(body["event"], "scraping_completed");
    assert_eq!(body["successfulPages"], 1);
    assert_eq!(body["totalPages"], 1);
}

#[tokio::test]
async fn test_dry_run_writes_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let out = dir.path().join("out");
    let overrides = JobOverrides {
        dry_run: true,
        ..Default::default()
    };
    let job = test_job(&server, &out, test_config(), overrides);

    let (summary, events) = crawl(job).await;

    assert!(summary.dry_run);
    assert_eq!(summary.successful_pages, 0);
    assert!(!out.exists());
    assert!(events
        .iter()
        .any(|e| matches!(e, CrawlEvent::DryRunUrl(url) if url == &format!("{}/", server.uri()))));
}

#[tokio::test]
async fn test_json_output_with_downloaded_images() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        "Gallery",
        r#"<p>Our logo:</p><img src="/img/logo.png" alt="Logo">"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/img/logo.png"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(vec![0x89, b'P', b'N', b'G'], "image/png"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let overrides = JobOverrides {
        format: Some(OutputFormat::Json),
        download_images: true,
        ..Default::default()
    };
    let job = test_job(&server, dir.path(), test_config(), overrides);

    let (summary, _) = crawl(job).await;

    assert_eq!(summary.successful_pages, 1);
    assert_eq!(summary.downloaded_images, 1);

    let assets: Vec<_> = fs::read_dir(dir.path().join("assets")).unwrap().collect();
    assert_eq!(assets.len(), 1);

    let page: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("pages/index.json")).unwrap())
            .unwrap();
    assert_eq!(page["metadata"]["title"], "Gallery");
    assert!(page["content"].as_str().unwrap().contains("[Logo](./assets/"));
    assert_eq!(page["statistics"]["images"], 1);

    let checkpoint = load_checkpoint(dir.path());
    assert_eq!(checkpoint.downloaded_images.len(), 1);
    assert!(checkpoint.downloaded_images[0].original.ends_with("/img/logo.png"));
}

#[tokio::test]
async fn test_seed_with_fragment_crawled_once() {
    let server = MockServer::start().await;
    mount_page(&server, "/", "Home", r#"<p>Top <a href="/">again</a></p>"#).await;

    let dir = TempDir::new().unwrap();
    let overrides = JobOverrides {
        output_dir: Some(dir.path().to_path_buf()),
        ..Default::default()
    };
    let job = build_job(&format!("{}/#top", server.uri()), test_config(), overrides)
        .expect("valid job");

    let (summary, _) = crawl(job).await;

    assert_eq!(summary.successful_pages, 1);
    assert_eq!(page_files(dir.path()), vec!["index.md"]);

    let checkpoint = load_checkpoint(dir.path());
    assert_eq!(checkpoint.sitemap.len(), 1);
    assert_eq!(checkpoint.sitemap[0].url, format!("{}/", server.uri()));
}

#[tokio::test]
async fn test_removed_elements_do_not_feed_frontier_or_assets() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        "Home",
        r#"<nav><a href="/navonly">Menu</a></nav>
           <p><a href="/a">Article</a></p>
           <img src="/img/photo.png" alt="Photo">
           <img src="/img/pixel.gif" width="1" height="1">"#,
    )
    .await;
    mount_page(&server, "/a", "A", "<p>Article body</p>").await;
    mount_page(&server, "/navonly", "Nav", "<p>Only linked from the menu</p>").await;
    Mock::given(method("GET"))
        .and(path("/img/photo.png"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(vec![0x89, b'P', b'N', b'G'], "image/png"),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/img/pixel.gif"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![b'G', b'I', b'F'], "image/gif"))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let overrides = JobOverrides {
        download_images: true,
        ..Default::default()
    };
    // Default removal list: nav and 1x1 images are stripped
    let job = test_job(&server, dir.path(), test_config(), overrides);

    let (summary, _) = crawl(job).await;

    assert_eq!(summary.successful_pages, 2);
    assert_eq!(page_files(dir.path()), vec!["a.md", "index.md"]);
    assert_eq!(summary.downloaded_images, 1);
    assert_eq!(fs::read_dir(dir.path().join("assets")).unwrap().count(), 1);
}
