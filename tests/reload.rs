//! Rule reloads against a running edge router.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::Value;
use tempfile::TempDir;

mod common;

async fn admin_post_reload(edge: &edge_router::lifecycle::EdgeRouter) -> u16 {
    let addr = edge.admin_addr.unwrap();
    reqwest::Client::new()
        .post(format!("http://{}/admin/reload", addr))
        .bearer_auth(common::ADMIN_KEY)
        .send()
        .await
        .unwrap()
        .status()
        .as_u16()
}

#[tokio::test]
async fn test_admin_reload_installs_new_rules() {
    let foo = common::start_mock_backend("foo upstream").await;
    let bar = common::start_mock_backend("bar upstream").await;

    let dir = TempDir::new().unwrap();
    let rules = common::write_file(dir.path(), "edge.rules", &format!("forward foo.com http://{}\n", foo));
    let (edge, shutdown) = common::start_edge(common::test_config(&rules)).await;

    assert_eq!(common::get(&edge, "foo.com", "/").await.1, "foo upstream");
    assert_eq!(common::get(&edge, "bar.com", "/").await.0, 404);

    common::write_file(
        dir.path(),
        "edge.rules",
        &format!("forward bar.com http://{}\n", bar),
    );
    assert_eq!(admin_post_reload(&edge).await, 202);

    let reloader = edge.reloader.clone();
    common::wait_until("second generation", || reloader.status().generation == 2).await;

    assert_eq!(common::get(&edge, "bar.com", "/").await.1, "bar upstream");
    assert_eq!(common::get(&edge, "foo.com", "/").await.0, 404);

    let routes: Value = reqwest::Client::new()
        .get(format!("http://{}/admin/routes", edge.admin_addr.unwrap()))
        .bearer_auth(common::ADMIN_KEY)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(routes.as_array().unwrap().len(), 1);

    shutdown.trigger();
    edge.wait().await;
}

#[tokio::test]
async fn test_malformed_rules_keep_current_table() {
    let backend = common::start_mock_backend("still here").await;

    let dir = TempDir::new().unwrap();
    let rules = common::write_file(
        dir.path(),
        "edge.rules",
        &format!("forward foo.com http://{}\n", backend),
    );
    let (edge, shutdown) = common::start_edge(common::test_config(&rules)).await;

    common::write_file(
        dir.path(),
        "edge.rules",
        "serve bar.com /srv/bar\nthis line is not a rule\n",
    );
    edge.reload.trigger("test");

    let reloader = edge.reloader.clone();
    common::wait_until("failed attempt", || reloader.status().attempts == 2).await;

    let status = edge.reloader.status();
    assert_eq!(status.generation, 1);
    assert!(status.last_error.unwrap().contains("line 2"));
    assert_eq!(common::get(&edge, "foo.com", "/").await, (200, "still here".to_string()));
    assert_eq!(common::get(&edge, "bar.com", "/").await.0, 404);

    shutdown.trigger();
    edge.wait().await;
}

#[tokio::test]
async fn test_admin_rejects_missing_key() {
    let dir = TempDir::new().unwrap();
    let rules = common::write_file(dir.path(), "edge.rules", "");
    let (edge, shutdown) = common::start_edge(common::test_config(&rules)).await;

    let status = reqwest::Client::new()
        .post(format!("http://{}/admin/reload", edge.admin_addr.unwrap()))
        .send()
        .await
        .unwrap()
        .status();
    assert_eq!(status.as_u16(), 401);
    assert_eq!(edge.reloader.status().attempts, 1);

    shutdown.trigger();
    edge.wait().await;
}

#[tokio::test]
async fn test_requests_succeed_while_reloading() {
    let one = common::start_mock_backend("one").await;
    let two = common::start_mock_backend("two").await;

    let dir = TempDir::new().unwrap();
    let rules_one = format!("forward foo.com http://{}\n", one);
    let rules_two = format!("# swapped\nforward foo.com http://{}\n", two);
    let rules = common::write_file(dir.path(), "edge.rules", &rules_one);
    let (edge, shutdown) = common::start_edge(common::test_config(&rules)).await;
    let edge = Arc::new(edge);

    let stop = Arc::new(AtomicBool::new(false));
    let reloading = {
        let edge = edge.clone();
        let stop = stop.clone();
        let dir = dir.path().to_path_buf();
        tokio::spawn(async move {
            let mut flip = false;
            while !stop.load(Ordering::Relaxed) {
                let text = if flip { &rules_one } else { &rules_two };
                common::replace_file(&dir, "edge.rules", text);
                edge.reload.trigger("test");
                flip = !flip;
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            }
        })
    };

    let mut clients = Vec::new();
    for _ in 0..8 {
        let edge = edge.clone();
        clients.push(tokio::spawn(async move {
            for _ in 0..25 {
                let (status, body) = common::get(&edge, "foo.com", "/").await;
                assert_eq!(status, 200);
                assert!(body == "one" || body == "two", "unexpected body {}", body);
            }
        }));
    }
    for client in clients {
        client.await.unwrap();
    }

    stop.store(true, Ordering::Relaxed);
    reloading.await.unwrap();
    assert!(edge.reloader.status().generation > 1);

    shutdown.trigger();
    let edge = Arc::try_unwrap(edge).ok().unwrap();
    edge.wait().await;
}

#[tokio::test]
async fn test_watched_rules_file_reloads_on_change() {
    let dir = TempDir::new().unwrap();
    let site = dir.path().join("site");
    std::fs::create_dir(&site).unwrap();
    common::write_file(&site, "index.html", "watched");

    let rules = common::write_file(dir.path(), "edge.rules", "");
    let mut config = common::test_config(&rules);
    config.rules.watch = true;
    let (edge, shutdown) = common::start_edge(config).await;
    assert!(edge.router.is_empty());

    common::write_file(
        dir.path(),
        "edge.rules",
        &format!("serve foo.com {}\n", site.display()),
    );

    let router = edge.router.clone();
    common::wait_until("watched reload", || router.len() == 1).await;
    assert_eq!(common::get(&edge, "foo.com", "/").await, (200, "watched".to_string()));

    shutdown.trigger();
    edge.wait().await;
}
