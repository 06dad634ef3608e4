//! In-process mock of the download mirror and build service

#![allow(dead_code)]

use std::time::Duration;

use axum::Router;
use firmware_selector::asu::AsuClient;
use firmware_selector::config::Config;
use firmware_selector::http::build_client;
use firmware_selector::mirror::MirrorClient;
use serde_json::{json, Value};
use tokio::net::TcpListener;

/// Serve `app` on an ephemeral port and return its base URL
pub async fn spawn_server(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind to ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("mock server");
    });
    format!("http://{}", addr)
}

pub fn test_config(base_url: &str) -> Config {
    Config {
        download_url: base_url.to_string(),
        asu_url: base_url.to_string(),
        poll_interval: Duration::from_millis(5),
        request_timeout: Duration::from_secs(5),
        ..Config::default()
    }
}

pub fn clients(base_url: &str) -> (MirrorClient, AsuClient) {
    let config = test_config(base_url);
    let http = build_client(&config).expect("http client");
    (
        MirrorClient::new(http.clone(), config.download_url.clone()),
        AsuClient::new(http, config.asu_url),
    )
}

pub fn overview_json() -> Value {
    json!({
        "release": "23.05.3",
        "profiles": [
            {
                "id": "tplink_archer-c7-v2",
                "target": "ath79/generic",
                "titles": [{"vendor": "TP-Link", "model": "Archer C7", "variant": "v2"}]
            },
            {
                "id": "generic",
                "target": "x86/64",
                "titles": [{"title": "Generic x86/64"}]
            }
        ]
    })
}

pub fn device_json() -> Value {
    json!({
        "id": "tplink_archer-c7-v2",
        "target": "ath79/generic",
        "arch_packages": "mips_24kc",
        "linux_kernel": {"release": "1", "vermagic": "abc", "version": "5.15.150"},
        "default_packages": ["base-files", "dnsmasq", "firewall4"],
        "device_packages": ["kmod-ath10k-ct", "ath10k-firmware-qca988x-ct"],
        "image_prefix": "openwrt-23.05.3-ath79-generic-tplink_archer-c7-v2",
        "images": [
            {"name": "factory.bin", "sha256": "aa", "type": "factory"},
            {"name": "sysupgrade.bin", "sha256": "bb", "type": "sysupgrade"}
        ],
        "supported_devices": ["tplink,archer-c7-v2"],
        "source_date_epoch": 1709500000,
        "titles": [{"vendor": "TP-Link", "model": "Archer C7", "variant": "v2"}],
        "version_code": "r23809-234f1a2efa",
        "version_number": "23.05.3"
    })
}
