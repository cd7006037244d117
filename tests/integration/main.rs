//! Integration tests for pkgproxy

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use tempfile::TempDir;

    fn pkgproxy(temp: &TempDir) -> Command {
        let mut cmd = cargo_bin_cmd!("pkgproxy");
        cmd.env("PKGPROXY_CONFIG", temp.path().join("config.toml"));
        cmd
    }

    #[test]
    fn help_displays() {
        let temp = TempDir::new().unwrap();
        pkgproxy(&temp)
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Lazy source-package proxy"));
    }

    #[test]
    fn version_displays() {
        let temp = TempDir::new().unwrap();
        pkgproxy(&temp)
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("pkgproxy"));
    }

    #[test]
    fn config_path() {
        let temp = TempDir::new().unwrap();
        pkgproxy(&temp)
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show() {
        let temp = TempDir::new().unwrap();
        pkgproxy(&temp)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[fetch]"))
            .stdout(predicate::str::contains("freshness_secs = 60"));
    }

    #[test]
    fn config_init_writes_file() {
        let temp = TempDir::new().unwrap();
        pkgproxy(&temp).args(["config", "init"]).assert().success();
        assert!(temp.path().join("config.toml").is_file());
    }

    #[test]
    fn serve_without_source_root_fails() {
        let temp = TempDir::new().unwrap();
        pkgproxy(&temp)
            .env_remove("GOPATH")
            .args(["serve", "--listen", "127.0.0.1:0"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("GOPATH"));
    }

    #[test]
    fn serve_with_bad_envfd_fails() {
        let temp = TempDir::new().unwrap();
        pkgproxy(&temp)
            .env_remove("RUNSIT_PORTFD_nope")
            .args(["serve", "--listen", "envfd:nope", "--source-root"])
            .arg(temp.path())
            .assert()
            .failure()
            .stderr(predicate::str::contains("RUNSIT_PORTFD_nope"));
    }
}

mod http_tests {
    use async_trait::async_trait;
    use pkgproxy::config::Config;
    use pkgproxy::fetch::Fetcher;
    use pkgproxy::server::{router, AppState, ListenAddr};
    use pkgproxy::{PackageKey, ProxyError, ProxyResult};
    use std::net::SocketAddr;
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    /// Lays out `<root>/<key>` as a git checkout holding one source file
    struct CountingFetcher {
        root: PathBuf,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Fetcher for CountingFetcher {
        async fn fetch(&self, key: &PackageKey) -> ProxyResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if key.as_str().starts_with("broken.example/") {
                return Err(ProxyError::fetch_failed(
                    key.as_str(),
                    "exit status: 1",
                    "unrecognized import path",
                ));
            }
            let dir = key.dir(&self.root);
            std::fs::create_dir_all(dir.join(".git")).unwrap();
            std::fs::write(dir.join("file.go"), "package pkg\n").unwrap();
            Ok(())
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    struct Proxy {
        addr: SocketAddr,
        fetcher: Arc<CountingFetcher>,
        _temp: TempDir,
    }

    impl Proxy {
        fn url(&self, path: &str) -> String {
            format!("http://{}{}", self.addr, path)
        }

        fn calls(&self) -> usize {
            self.fetcher.calls.load(Ordering::SeqCst)
        }
    }

    async fn spawn_proxy() -> Proxy {
        let temp = TempDir::new().unwrap();
        let fetcher = Arc::new(CountingFetcher {
            root: temp.path().to_path_buf(),
            calls: AtomicUsize::new(0),
        });

        let mut config = Config::default();
        config.source.root = Some(temp.path().to_path_buf());
        let state = Arc::new(AppState::with_fetcher(&config, fetcher.clone()).unwrap());

        let listener = ListenAddr::parse("127.0.0.1:0").bind().await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(state)).await.unwrap();
        });

        Proxy {
            addr,
            fetcher,
            _temp: temp,
        }
    }

    struct Reply {
        status: u16,
        content_type: Option<String>,
        body: Vec<u8>,
    }

    fn agent() -> ureq::Agent {
        ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .into()
    }

    fn reply(mut resp: ureq::http::Response<ureq::Body>) -> Reply {
        let content_type = resp
            .headers()
            .get("content-type")
            .map(|v| v.to_str().unwrap().to_string());
        Reply {
            status: resp.status().as_u16(),
            content_type,
            body: resp.body_mut().read_to_vec().unwrap(),
        }
    }

    async fn get(url: String) -> Reply {
        tokio::task::spawn_blocking(move || reply(agent().get(&url).call().unwrap()))
            .await
            .unwrap()
    }

    async fn post(url: String) -> Reply {
        tokio::task::spawn_blocking(move || reply(agent().post(&url).send_empty().unwrap()))
            .await
            .unwrap()
    }

    fn tar_names(body: &[u8]) -> Vec<String> {
        tar::Archive::new(body)
            .entries()
            .unwrap()
            .map(|e| e.unwrap().path().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn package_is_fetched_once_then_served_from_cache() {
        let proxy = spawn_proxy().await;

        let first = get(proxy.url("/example.org/pkg")).await;
        assert_eq!(first.status, 200);
        assert_eq!(first.content_type.as_deref(), Some("application/x-tar"));
        assert_eq!(tar_names(&first.body), vec!["file.go".to_string()]);
        assert_eq!(proxy.calls(), 1);

        let second = get(proxy.url("/example.org/pkg")).await;
        assert_eq!(second.status, 200);
        assert_eq!(proxy.calls(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn single_file_is_served_as_text() {
        let proxy = spawn_proxy().await;

        let reply = get(proxy.url("/example.org/pkg/file.go")).await;
        assert_eq!(reply.status, 200);
        assert_eq!(
            reply.content_type.as_deref(),
            Some("text/plain; charset=utf-8")
        );
        assert_eq!(reply.body, b"package pkg\n");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn missing_file_is_a_server_error() {
        let proxy = spawn_proxy().await;

        let reply = get(proxy.url("/example.org/pkg/absent.go")).await;
        assert_eq!(reply.status, 500);
        assert_eq!(proxy.calls(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn non_canonical_path_is_rejected_without_fetch() {
        let proxy = spawn_proxy().await;

        for path in ["/example.org/pkg/../other", "/example.org//pkg", "/example.org/pkg/"] {
            let reply = get(proxy.url(path)).await;
            assert_eq!(reply.status, 500, "{path}");
            assert_eq!(String::from_utf8_lossy(&reply.body), "invalid path");
        }
        assert_eq!(proxy.calls(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn escaped_dot_segments_are_rejected_without_fetch() {
        let proxy = spawn_proxy().await;

        for path in ["/example.org/%2e%2e/etc", "/example.org/pkg/%2E%2E", "/a/%2fb"] {
            let reply = get(proxy.url(path)).await;
            assert_eq!(reply.status, 500, "{path}");
            assert_eq!(String::from_utf8_lossy(&reply.body), "invalid path");
        }
        assert_eq!(proxy.calls(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn escaped_segment_is_fetched_decoded() {
        let proxy = spawn_proxy().await;

        let reply = get(proxy.url("/example.org/my%20pkg/file.go")).await;
        assert_eq!(reply.status, 200);
        assert!(proxy.fetcher.root.join("example.org/my pkg/file.go").is_file());
        assert_eq!(proxy.calls(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn flag_like_key_is_rejected_without_fetch() {
        let proxy = spawn_proxy().await;

        let reply = get(proxy.url("/-insecure")).await;
        assert_eq!(reply.status, 500);
        assert_eq!(String::from_utf8_lossy(&reply.body), "invalid path");
        assert_eq!(proxy.calls(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn any_method_is_served() {
        let proxy = spawn_proxy().await;

        let reply = post(proxy.url("/example.org/pkg/file.go")).await;
        assert_eq!(reply.status, 200);
        assert_eq!(reply.body, b"package pkg\n");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn fetch_failure_reports_output() {
        let proxy = spawn_proxy().await;

        let reply = get(proxy.url("/broken.example/pkg")).await;
        assert_eq!(reply.status, 500);
        let body = String::from_utf8_lossy(&reply.body);
        assert!(body.contains("broken.example/pkg"));
        assert!(body.contains("unrecognized import path"));

        // Failures are not cached
        get(proxy.url("/broken.example/pkg")).await;
        assert_eq!(proxy.calls(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn placeholder_and_empty_paths() {
        let proxy = spawn_proxy().await;

        let root = get(proxy.url("/")).await;
        assert_eq!(root.status, 200);
        assert!(String::from_utf8_lossy(&root.body).contains("go get proxy"));

        for path in ["/favicon.ico", "/robots.txt"] {
            let reply = get(proxy.url(path)).await;
            assert_eq!(reply.status, 200);
            assert!(reply.body.is_empty());
        }
        assert_eq!(proxy.calls(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn sibling_package_reuses_checkout_fetch() {
        let proxy = spawn_proxy().await;
        let root: &Path = proxy.fetcher.root.as_path();
        std::fs::create_dir_all(root.join("example.org/repo/sub")).unwrap();
        std::fs::write(root.join("example.org/repo/sub/sub.go"), "package sub\n").unwrap();

        assert_eq!(get(proxy.url("/example.org/repo")).await.status, 200);
        let reply = get(proxy.url("/example.org/repo/sub/sub.go")).await;
        assert_eq!(reply.status, 200);
        assert_eq!(reply.body, b"package sub\n");
        assert_eq!(proxy.calls(), 1);
    }
}
