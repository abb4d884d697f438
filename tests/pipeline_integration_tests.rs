use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use proxy_sync::config::Config;
use proxy_sync::proxy::CheckerConfig;
use proxy_sync::store::GithubStore;
use proxy_sync::Pipeline;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn contents_path(file: &str) -> String {
    format!("/repos/parserpp/ip_ports/contents/{file}")
}

async fn pipeline_for(server: &MockServer, config: Config) -> Pipeline {
    let store = GithubStore::new(&config.owner, &config.repo, &config.token)
        .unwrap()
        .with_api_base(&server.uri());
    Pipeline::new(config).unwrap().with_store(store)
}

/// Full merge-and-publish runs against a mock remote store
mod pipeline_integration_tests {
    use super::*;

    /// A run merges the published set with the scraped batch, publishes all
    /// three artifacts and deletes the local input.
    #[tokio::test]
    async fn test_sync_merges_publishes_and_cleans_up() {
        let server = MockServer::start().await;

        let published = "{\"host\":\"1.2.3.4\",\"port\":8080}\n";
        Mock::given(method("GET"))
            .and(path(contents_path("proxyinfo.json")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": BASE64.encode(published),
                "sha": "oldsha",
            })))
            .mount(&server)
            .await;
        // the other two artifacts do not exist yet
        for file in ["proxyinfo.txt", "db.json"] {
            Mock::given(method("GET"))
                .and(path(contents_path(file)))
                .respond_with(ResponseTemplate::new(404))
                .mount(&server)
                .await;
        }
        for file in ["proxyinfo.json", "proxyinfo.txt", "db.json"] {
            Mock::given(method("PUT"))
                .and(path(contents_path(file)))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
                .expect(1)
                .mount(&server)
                .await;
        }

        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("proxy.list.out");
        std::fs::write(
            &input,
            "{\"host\":\"1.2.3.4\",\"port\":8080,\"type\":\"http\",\"anonymity\":\"elite\"}\n\
             {\"host\":\"5.6.7.8\",\"port\":443,\"type\":\"https\"}\n",
        )
        .unwrap();

        let mut config = Config::new("test-token".to_string());
        config.input_file = input.clone();
        config.raw_file = dir.path().join("proxy.list");

        let pipeline = pipeline_for(&server, config).await;
        pipeline.sync().await.unwrap();

        // input cleaned up after the run
        assert!(!input.exists());
    }

    /// A missing input file is fatal before anything is published.
    #[tokio::test]
    async fn test_sync_missing_input_is_fatal() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(contents_path("proxyinfo.json")))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::new("test-token".to_string());
        config.input_file = dir.path().join("proxy.list.out");
        config.raw_file = dir.path().join("proxy.list");

        let pipeline = pipeline_for(&server, config).await;
        assert!(pipeline.sync().await.is_err());
    }

    /// A failed download of the published set degrades to an empty set and
    /// the run proceeds.
    #[tokio::test]
    async fn test_sync_download_failure_degrades_to_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(contents_path("proxyinfo.json")))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;
        for file in ["proxyinfo.txt", "db.json"] {
            Mock::given(method("GET"))
                .and(path(contents_path(file)))
                .respond_with(ResponseTemplate::new(404))
                .mount(&server)
                .await;
        }
        for file in ["proxyinfo.json", "proxyinfo.txt", "db.json"] {
            Mock::given(method("PUT"))
                .and(path(contents_path(file)))
                .respond_with(ResponseTemplate::new(201).set_body_json(json!({})))
                .expect(1)
                .mount(&server)
                .await;
        }

        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("proxy.list.out");
        std::fs::write(&input, "{\"host\":\"1.2.3.4\",\"port\":8080}\n").unwrap();

        let mut config = Config::new("test-token".to_string());
        config.input_file = input;
        config.raw_file = dir.path().join("proxy.list");

        let pipeline = pipeline_for(&server, config).await;
        pipeline.sync().await.unwrap();
    }

    /// A validating run publishes only the survivors, under the validated
    /// commit message. One mock server plays the live candidate relay, a
    /// second one the store.
    #[tokio::test]
    async fn test_validating_sync_publishes_only_survivors() {
        let relay = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"origin": "127.0.0.1"})),
            )
            .mount(&relay)
            .await;
        let relay_port = relay.address().port();

        let store = MockServer::start().await;
        for file in ["proxyinfo.json", "proxyinfo.txt", "db.json"] {
            Mock::given(method("GET"))
                .and(path(contents_path(file)))
                .respond_with(ResponseTemplate::new(404))
                .mount(&store)
                .await;
        }
        for file in ["proxyinfo.json", "db.json"] {
            Mock::given(method("PUT"))
                .and(path(contents_path(file)))
                .respond_with(ResponseTemplate::new(201).set_body_json(json!({})))
                .expect(1)
                .mount(&store)
                .await;
        }
        // the pair artifact lists exactly the surviving proxy
        Mock::given(method("PUT"))
            .and(path(contents_path("proxyinfo.txt")))
            .and(body_partial_json(json!({
                "message": "Update validated proxy list",
                "content": BASE64.encode(format!("127.0.0.1:{relay_port}\n")),
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({})))
            .expect(1)
            .mount(&store)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("proxy.list.out");
        std::fs::write(
            &input,
            format!(
                "{{\"host\":\"127.0.0.1\",\"port\":{relay_port},\"type\":\"http\"}}\n\
                 {{\"host\":\"192.0.2.1\",\"port\":9,\"type\":\"http\"}}\n"
            ),
        )
        .unwrap();

        let mut config = Config::new("test-token".to_string());
        config.input_file = input.clone();
        config.raw_file = dir.path().join("proxy.list");
        config.validate = true;
        config.checker = CheckerConfig::new().with_timeout(Duration::from_millis(800));

        let pipeline = pipeline_for(&store, config).await;
        pipeline.sync().await.unwrap();

        assert!(!input.exists());
    }

    /// When no proxy survives validation the run fails, publishes nothing,
    /// and still cleans up the local input.
    #[tokio::test]
    async fn test_validating_sync_zero_survivors_is_fatal() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(contents_path("proxyinfo.json")))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("proxy.list.out");
        // reserved TEST-NET-1 address, nothing listens there
        std::fs::write(&input, "{\"host\":\"192.0.2.1\",\"port\":9}\n").unwrap();

        let mut config = Config::new("test-token".to_string());
        config.input_file = input.clone();
        config.raw_file = dir.path().join("proxy.list");
        config.validate = true;
        config.checker = CheckerConfig::new().with_timeout(Duration::from_millis(500));

        let pipeline = pipeline_for(&server, config).await;
        assert!(pipeline.sync().await.is_err());
        assert!(!input.exists());
    }

    /// Raw pass-through uploads both local files verbatim and cleans up.
    #[tokio::test]
    async fn test_passthrough_uploads_raw_files() {
        let server = MockServer::start().await;
        let uploads = [
            ("proxy.list", "Update proxy list"),
            ("proxy.list.out", "Update proxy list output"),
        ];
        for (file, message) in uploads {
            Mock::given(method("GET"))
                .and(path(contents_path(file)))
                .respond_with(ResponseTemplate::new(404))
                .mount(&server)
                .await;
            Mock::given(method("PUT"))
                .and(path(contents_path(file)))
                .and(body_partial_json(json!({"message": message})))
                .respond_with(ResponseTemplate::new(201).set_body_json(json!({})))
                .expect(1)
                .mount(&server)
                .await;
        }

        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("proxy.list");
        let input = dir.path().join("proxy.list.out");
        std::fs::write(&raw, "1.2.3.4:8080\n").unwrap();
        std::fs::write(&input, "{\"host\":\"1.2.3.4\",\"port\":8080}\n").unwrap();

        let mut config = Config::new("test-token".to_string());
        config.raw_file = raw.clone();
        config.input_file = input.clone();

        let pipeline = pipeline_for(&server, config).await;
        pipeline.passthrough().await.unwrap();

        assert!(!raw.exists());
        assert!(!input.exists());
    }

    /// A publish failure aborts the run but still cleans up local inputs.
    #[tokio::test]
    async fn test_publish_failure_is_fatal_but_cleans_up() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(contents_path("proxyinfo.json")))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        // first artifact fails with a non-NotFound error on create
        Mock::given(method("PUT"))
            .and(path(contents_path("proxyinfo.json")))
            .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
            .mount(&server)
            .await;
        // the remaining artifacts are never attempted
        for file in ["proxyinfo.txt", "db.json"] {
            Mock::given(method("PUT"))
                .and(path(contents_path(file)))
                .respond_with(ResponseTemplate::new(200))
                .expect(0)
                .mount(&server)
                .await;
        }

        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("proxy.list.out");
        std::fs::write(&input, "{\"host\":\"1.2.3.4\",\"port\":8080}\n").unwrap();

        let mut config = Config::new("test-token".to_string());
        config.input_file = input.clone();
        config.raw_file = dir.path().join("proxy.list");

        let pipeline = pipeline_for(&server, config).await;
        assert!(pipeline.sync().await.is_err());
        assert!(!input.exists());
    }
}
