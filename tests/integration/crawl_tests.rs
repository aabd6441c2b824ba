//! Integration tests for the crawler
//!
//! These tests use wiremock to serve a synthetic question tree and run
//! the full fetch, persist and count cycle end-to-end.

use qtree_mirror::config::{Config, CrawlerConfig, IgnoreConfig, OutputConfig, UserAgentConfig};
use qtree_mirror::crawler::TreeCrawler;
use qtree_mirror::document::NodeId;
use qtree_mirror::state::{IgnoreMode, NodeState};
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock server
fn create_test_config(base_url: &str, output_dir: &Path) -> Config {
    Config {
        crawler: CrawlerConfig {
            tree_root: format!("{}/", base_url),
            root_id: "R".to_string(),
            max_depth: 64,
            max_retries: 3,
            retry_delay_ms: 1, // Very short for testing
            max_retry_delay_ms: 5,
            request_timeout_secs: 5,
            progress_interval: 1000,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: None,
        },
        output: OutputConfig {
            directory: output_dir.display().to_string(),
            extension: "xml".to_string(),
        },
        ignore: IgnoreConfig::default(),
    }
}

/// Builds a node document: own id first, then children
fn node_xml(id: &str, children: &[&str], questions: Option<u64>) -> String {
    let mut xml = format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<tournament>\n  <TextId>{}</TextId>\n", id);
    for child in children {
        xml.push_str(&format!("  <tour><TextId>{}</TextId></tour>\n", child));
    }
    if let Some(n) = questions {
        xml.push_str(&format!("  <QuestionsNum>{}</QuestionsNum>\n", n));
    }
    xml.push_str("</tournament>\n");
    xml
}

/// Serves a node document and expects it to be requested exactly once
async fn mount_node(server: &MockServer, id: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(format!("/{}/xml", id)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "application/xml"),
        )
        .expect(1)
        .named(format!("node {}", id))
        .mount(server)
        .await;
}

async fn run_crawl(config: &Config) -> (TreeCrawler, qtree_mirror::CrawlReport) {
    let mut crawler = TreeCrawler::from_config(config).expect("Failed to create crawler");
    let report = crawler
        .crawl(&NodeId::from(config.crawler.root_id.as_str()))
        .await
        .expect("Crawl failed");
    (crawler, report)
}

fn written_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .expect("Failed to read output dir")
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_end_to_end_root_with_two_leaves() {
    let mock_server = MockServer::start().await;
    let out = TempDir::new().unwrap();

    // The root lists itself among its TextId entries
    mount_node(&mock_server, "R", node_xml("R", &["L1", "L2"], None)).await;
    mount_node(&mock_server, "L1", node_xml("L1", &[], Some(5))).await;
    mount_node(&mock_server, "L2", node_xml("L2", &[], Some(7))).await;

    let config = create_test_config(&mock_server.uri(), out.path());
    let (crawler, report) = run_crawl(&config).await;

    assert_eq!(written_files(out.path()), vec!["L1.xml", "L2.xml", "R.xml"]);
    assert_eq!(crawler.storage().persisted_count(), 3);
    assert_eq!(report.total_questions, 12);
    assert_eq!(report.outcome("R").unwrap().state, NodeState::Branch);
    assert_eq!(report.outcome("L1").unwrap().state, NodeState::Leaf);
    assert_eq!(report.outcome("L1").unwrap().questions, Some(5));
    assert_eq!(report.outcome("L2").unwrap().depth, 1);
    assert!(!report.cancelled);
    assert!(report.finished_at.is_some());

    // Persisted bytes are the document as served
    let saved = std::fs::read_to_string(out.path().join("L1.xml")).unwrap();
    assert_eq!(saved, node_xml("L1", &[], Some(5)));
}

#[tokio::test]
async fn test_cycle_fetches_each_node_once() {
    let mock_server = MockServer::start().await;
    let out = TempDir::new().unwrap();

    // A -> B -> A, without relying on the self-listing
    mount_node(&mock_server, "A", node_xml("A", &["B"], Some(1))).await;
    mount_node(&mock_server, "B", node_xml("B", &["A"], Some(2))).await;

    let mut config = create_test_config(&mock_server.uri(), out.path());
    config.crawler.root_id = "A".to_string();
    let (_, report) = run_crawl(&config).await;

    assert_eq!(report.outcome("A").unwrap().state, NodeState::Branch);
    assert_eq!(report.outcome("B").unwrap().state, NodeState::Leaf);
    assert_eq!(report.total_questions, 2);
    assert_eq!(report.outcomes.len(), 2);
}

#[tokio::test]
async fn test_self_reference_terminates_as_leaf() {
    let mock_server = MockServer::start().await;
    let out = TempDir::new().unwrap();

    mount_node(&mock_server, "X", node_xml("X", &["X", "X"], Some(4))).await;

    let mut config = create_test_config(&mock_server.uri(), out.path());
    config.crawler.root_id = "X".to_string();
    let (_, report) = run_crawl(&config).await;

    assert_eq!(report.outcome("X").unwrap().state, NodeState::Leaf);
    assert_eq!(report.total_questions, 4);
    assert_eq!(written_files(out.path()), vec!["X.xml"]);
}

#[tokio::test]
async fn test_document_without_text_id_is_discarded() {
    let mock_server = MockServer::start().await;
    let out = TempDir::new().unwrap();

    mount_node(&mock_server, "R", node_xml("R", &["GONE", "L1"], None)).await;
    mount_node(
        &mock_server,
        "GONE",
        "<error><QuestionsNum>100</QuestionsNum></error>".to_string(),
    )
    .await;
    mount_node(&mock_server, "L1", node_xml("L1", &[], Some(3))).await;

    let config = create_test_config(&mock_server.uri(), out.path());
    let (_, report) = run_crawl(&config).await;

    assert_eq!(report.outcome("GONE").unwrap().state, NodeState::Discarded);
    assert!(report.outcome("GONE").unwrap().path.is_none());
    assert_eq!(written_files(out.path()), vec!["L1.xml", "R.xml"]);
    // The discarded node's QuestionsNum is not counted
    assert_eq!(report.total_questions, 3);
}

#[tokio::test]
async fn test_node_with_only_discarded_children_is_counted_as_leaf() {
    let mock_server = MockServer::start().await;
    let out = TempDir::new().unwrap();

    mount_node(&mock_server, "R", node_xml("R", &["X", "Y"], Some(9))).await;
    mount_node(&mock_server, "X", "<empty/>".to_string()).await;
    mount_node(&mock_server, "Y", "<empty></empty>".to_string()).await;

    let config = create_test_config(&mock_server.uri(), out.path());
    let (_, report) = run_crawl(&config).await;

    assert_eq!(report.outcome("R").unwrap().state, NodeState::Leaf);
    assert_eq!(report.count(NodeState::Discarded), 2);
    assert_eq!(report.total_questions, 9);
    assert_eq!(written_files(out.path()), vec!["R.xml"]);
}

#[tokio::test]
async fn test_ignore_list_excludes_children() {
    let mock_server = MockServer::start().await;
    let out = TempDir::new().unwrap();

    mount_node(&mock_server, "R", node_xml("R", &["A", "B", "C"], None)).await;
    mount_node(&mock_server, "A", node_xml("A", &[], Some(1))).await;
    mount_node(&mock_server, "C", node_xml("C", &[], Some(2))).await;

    // B must never be requested
    Mock::given(method("GET"))
        .and(path("/B/xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(node_xml("B", &[], Some(50))))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&mock_server.uri(), out.path());
    config.ignore = IgnoreConfig {
        ids: vec!["B".to_string()],
        mode: IgnoreMode::Exact,
    };
    let (_, report) = run_crawl(&config).await;

    assert_eq!(report.outcome("B").unwrap().state, NodeState::Ignored);
    assert_eq!(report.total_questions, 3);
    assert_eq!(written_files(out.path()), vec!["A.xml", "C.xml", "R.xml"]);
}

#[tokio::test]
async fn test_substring_ignore_mode() {
    let mock_server = MockServer::start().await;
    let out = TempDir::new().unwrap();

    mount_node(&mock_server, "R", node_xml("R", &["t1", "t2"], None)).await;
    mount_node(&mock_server, "t2", node_xml("t2", &[], Some(6))).await;

    let mut config = create_test_config(&mock_server.uri(), out.path());
    config.ignore = IgnoreConfig {
        ids: vec!["t1,t3".to_string()],
        mode: IgnoreMode::Substring,
    };
    let (_, report) = run_crawl(&config).await;

    assert_eq!(report.outcome("t1").unwrap().state, NodeState::Ignored);
    assert_eq!(report.total_questions, 6);
}

#[tokio::test]
async fn test_aggregation_over_deeper_tree() {
    let mock_server = MockServer::start().await;
    let out = TempDir::new().unwrap();

    mount_node(&mock_server, "R", node_xml("R", &["A", "B"], None)).await;
    mount_node(&mock_server, "A", node_xml("A", &["A1", "A2"], Some(1000))).await;
    mount_node(&mock_server, "A1", node_xml("A1", &[], Some(12))).await;
    mount_node(&mock_server, "A2", node_xml("A2", &[], Some(24))).await;
    // B is listed again under B1 and must not be re-entered
    mount_node(&mock_server, "B", node_xml("B", &["B1"], None)).await;
    mount_node(&mock_server, "B1", node_xml("B1", &["B", "A2"], Some(36))).await;

    let config = create_test_config(&mock_server.uri(), out.path());
    let (_, report) = run_crawl(&config).await;

    // Branch nodes' own QuestionsNum is not counted
    assert_eq!(report.total_questions, 12 + 24 + 36);
    assert_eq!(report.outcome("A").unwrap().state, NodeState::Branch);
    assert_eq!(report.outcome("B1").unwrap().state, NodeState::Leaf);
    assert_eq!(report.outcome("B1").unwrap().depth, 2);
    assert_eq!(written_files(out.path()).len(), 6);
}

#[tokio::test]
async fn test_transient_failures_are_retried_without_duplicate_writes() {
    let mock_server = MockServer::start().await;
    let out = TempDir::new().unwrap();

    // First two requests fail, the third succeeds
    Mock::given(method("GET"))
        .and(path("/R/xml"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&mock_server)
        .await;
    mount_node(&mock_server, "R", node_xml("R", &[], Some(8))).await;

    let config = create_test_config(&mock_server.uri(), out.path());
    let (crawler, report) = run_crawl(&config).await;

    assert_eq!(report.outcome("R").unwrap().state, NodeState::Leaf);
    assert_eq!(report.total_questions, 8);
    assert_eq!(crawler.storage().persisted_count(), 1);
    assert_eq!(written_files(out.path()), vec!["R.xml"]);
}

#[tokio::test]
async fn test_exhausted_retries_skip_only_that_subtree() {
    let mock_server = MockServer::start().await;
    let out = TempDir::new().unwrap();

    mount_node(&mock_server, "R", node_xml("R", &["BAD", "L1"], None)).await;
    mount_node(&mock_server, "L1", node_xml("L1", &[], Some(5))).await;

    // max-retries = 3, so four attempts in total
    Mock::given(method("GET"))
        .and(path("/BAD/xml"))
        .respond_with(ResponseTemplate::new(500))
        .expect(4)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), out.path());
    let (_, report) = run_crawl(&config).await;

    let bad = report.outcome("BAD").unwrap();
    assert_eq!(bad.state, NodeState::Failed);
    assert!(bad.error.as_deref().unwrap().contains("4 attempts"));
    assert_eq!(report.outcome("R").unwrap().state, NodeState::Branch);
    assert_eq!(report.total_questions, 5);
}

#[tokio::test]
async fn test_malformed_xml_is_not_retried() {
    let mock_server = MockServer::start().await;
    let out = TempDir::new().unwrap();

    mount_node(&mock_server, "R", node_xml("R", &["M"], Some(2))).await;
    mount_node(
        &mock_server,
        "M",
        "<tour><TextId>M</TextId></wrong>".to_string(),
    )
    .await;

    let config = create_test_config(&mock_server.uri(), out.path());
    let (_, report) = run_crawl(&config).await;

    assert_eq!(report.outcome("M").unwrap().state, NodeState::Failed);
    // The only child failed, so the root is a leaf
    assert_eq!(report.outcome("R").unwrap().state, NodeState::Leaf);
    assert_eq!(report.total_questions, 2);
}

#[tokio::test]
async fn test_not_found_is_not_retried() {
    let mock_server = MockServer::start().await;
    let out = TempDir::new().unwrap();

    mount_node(&mock_server, "R", node_xml("R", &["MISSING"], None)).await;
    Mock::given(method("GET"))
        .and(path("/MISSING/xml"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), out.path());
    let (_, report) = run_crawl(&config).await;

    let missing = report.outcome("MISSING").unwrap();
    assert_eq!(missing.state, NodeState::Failed);
    assert!(missing.error.as_deref().unwrap().contains("404"));
}

#[tokio::test]
async fn test_progress_milestones() {
    let mock_server = MockServer::start().await;
    let out = TempDir::new().unwrap();

    mount_node(&mock_server, "R", node_xml("R", &["A", "B", "C"], None)).await;
    mount_node(&mock_server, "A", node_xml("A", &[], Some(600))).await;
    mount_node(&mock_server, "B", node_xml("B", &[], Some(600))).await;
    mount_node(&mock_server, "C", node_xml("C", &[], Some(900))).await;

    let config = create_test_config(&mock_server.uri(), out.path());
    let (_, report) = run_crawl(&config).await;

    assert_eq!(report.total_questions, 2100);
    assert_eq!(report.milestones, vec![1000, 2000]);
}

#[tokio::test]
async fn test_max_depth_bounds_recursion() {
    let mock_server = MockServer::start().await;
    let out = TempDir::new().unwrap();

    mount_node(&mock_server, "R", node_xml("R", &["A"], None)).await;
    mount_node(&mock_server, "A", node_xml("A", &["B"], Some(3))).await;
    Mock::given(method("GET"))
        .and(path("/B/xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(node_xml("B", &[], Some(1))))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&mock_server.uri(), out.path());
    config.crawler.max_depth = 1;
    let (_, report) = run_crawl(&config).await;

    assert_eq!(report.outcome("B").unwrap().state, NodeState::DepthExceeded);
    assert_eq!(report.outcome("A").unwrap().state, NodeState::Leaf);
    assert_eq!(report.total_questions, 3);
}

#[tokio::test]
async fn test_depth_bound_does_not_hide_shallower_path() {
    let mock_server = MockServer::start().await;
    let out = TempDir::new().unwrap();

    // X is first seen below A at depth 2, then directly under R at depth 1
    mount_node(&mock_server, "R", node_xml("R", &["A", "X"], None)).await;
    mount_node(&mock_server, "A", node_xml("A", &["X"], Some(3))).await;
    mount_node(&mock_server, "X", node_xml("X", &[], Some(50))).await;

    let mut config = create_test_config(&mock_server.uri(), out.path());
    config.crawler.max_depth = 1;
    let (_, report) = run_crawl(&config).await;

    let x = report.outcome("X").unwrap();
    assert_eq!(x.state, NodeState::Leaf);
    assert_eq!(x.depth, 1);
    assert_eq!(report.count(NodeState::DepthExceeded), 0);
    assert_eq!(report.total_questions, 53);
    assert_eq!(written_files(out.path()), vec!["A.xml", "R.xml", "X.xml"]);
}

#[tokio::test]
async fn test_overlong_text_id_does_not_abort_crawl() {
    let mock_server = MockServer::start().await;
    let out = TempDir::new().unwrap();
    let long_id = "L".repeat(300);

    mount_node(&mock_server, "R", node_xml("R", &[long_id.as_str(), "OK"], None)).await;
    mount_node(&mock_server, &long_id, node_xml(&long_id, &[], Some(4))).await;
    mount_node(&mock_server, "OK", node_xml("OK", &[], Some(6))).await;

    let config = create_test_config(&mock_server.uri(), out.path());
    let (_, report) = run_crawl(&config).await;

    // The long node is traversed and counted, only its write is skipped
    let long = report.outcome(&long_id).unwrap();
    assert_eq!(long.state, NodeState::Leaf);
    assert!(long.path.is_none());
    assert_eq!(report.outcome("OK").unwrap().state, NodeState::Leaf);
    assert_eq!(report.total_questions, 10);
    assert_eq!(written_files(out.path()), vec!["OK.xml", "R.xml"]);
}

#[tokio::test]
async fn test_unwritable_document_fails_only_that_node() {
    let mock_server = MockServer::start().await;
    let out = TempDir::new().unwrap();
    // A directory already occupies D's file name
    std::fs::create_dir(out.path().join("D.xml")).unwrap();

    mount_node(&mock_server, "R", node_xml("R", &["D", "OK"], None)).await;
    mount_node(&mock_server, "D", node_xml("D", &["UNDER_D"], Some(4))).await;
    mount_node(&mock_server, "OK", node_xml("OK", &[], Some(6))).await;
    Mock::given(method("GET"))
        .and(path("/UNDER_D/xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(node_xml("UNDER_D", &[], Some(1))))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), out.path());
    let (_, report) = run_crawl(&config).await;

    let d = report.outcome("D").unwrap();
    assert_eq!(d.state, NodeState::Failed);
    assert!(d.error.as_deref().unwrap().contains("D.xml"));
    assert_eq!(report.outcome("OK").unwrap().state, NodeState::Leaf);
    assert_eq!(report.outcome("R").unwrap().state, NodeState::Branch);
    assert_eq!(report.total_questions, 6);
}

#[tokio::test]
async fn test_windows_1251_document_is_mirrored() {
    let mock_server = MockServer::start().await;
    let out = TempDir::new().unwrap();

    // Child id "Тур" in windows-1251
    let mut body = br#"<?xml version="1.0" encoding="windows-1251"?><tour><TextId>"#.to_vec();
    body.extend_from_slice(&[0xD2, 0xF3, 0xF0]);
    body.extend_from_slice(b"</TextId><QuestionsNum>9</QuestionsNum></tour>");

    mount_node(&mock_server, "R", node_xml("R", &["T"], None)).await;
    Mock::given(method("GET"))
        .and(path("/T/xml"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), out.path());
    let (_, report) = run_crawl(&config).await;

    assert_eq!(report.outcome("T").unwrap().state, NodeState::Leaf);
    assert_eq!(report.total_questions, 9);
    assert_eq!(std::fs::read(out.path().join("Тур.xml")).unwrap(), body);
}

#[tokio::test]
async fn test_each_crawl_starts_fresh() {
    let mock_server = MockServer::start().await;
    let out = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/R/xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(node_xml("R", &[], Some(10))))
        .expect(2)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), out.path());
    let mut crawler = TreeCrawler::from_config(&config).unwrap();

    let first = crawler.crawl(&NodeId::from("R")).await.unwrap();
    let second = crawler.crawl(&NodeId::from("R")).await.unwrap();

    assert_eq!(first.total_questions, 10);
    assert_eq!(second.total_questions, 10);
}
