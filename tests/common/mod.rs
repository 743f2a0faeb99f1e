#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;

use axum::Router;
use clan_war_reporter::config::Config;
use tokio::net::TcpListener;

/// Serves `router` on an ephemeral local port and returns its address.
pub async fn spawn_stub(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("stub server");
    });
    addr
}

/// A configuration with every required value filled in, plus `overrides`.
pub fn test_config(overrides: &[(&str, &str)]) -> Config {
    let mut values: HashMap<String, String> = [
        ("COC_API_TOKEN", "test-token"),
        ("SPREADSHEET_ID", "sheet-123"),
        ("GOOGLE_CREDS_B64", "e30="),
        ("CLAN_TAG", "#PQJJQ2PG"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    for (k, v) in overrides {
        values.insert(k.to_string(), v.to_string());
    }
    Config::from_lookup(|name| values.get(name).cloned()).expect("test config")
}

pub const WAR_JSON: &str = r##"{
    "state": "inWar",
    "teamSize": 2,
    "startTime": "20240501T120000.000Z",
    "endTime": "20240502T120000.000Z",
    "clan": {
        "tag": "#PQJJQ2PG",
        "name": "Home",
        "stars": 5,
        "destructionPercentage": 77.5,
        "members": [
            {"tag": "#A", "name": "X", "townhallLevel": 13, "mapPosition": 1},
            {"tag": "#C", "name": "Y", "townhallLevel": 12, "mapPosition": 2}
        ]
    },
    "opponent": {
        "tag": "#ENEMY",
        "name": "Away",
        "stars": 3,
        "destructionPercentage": 50.0,
        "members": [
            {"tag": "#B", "name": "Z", "townhallLevel": 13, "mapPosition": 1}
        ]
    },
    "attacks": [
        {"attackerTag": "#A", "defenderTag": "#B", "stars": 2, "destructionPercentage": 55.5},
        {"attackerTag": "#B", "defenderTag": "#A", "stars": 3, "destructionPercentage": 100},
        {"attackerTag": "#A", "defenderTag": "#B", "stars": 3, "destructionPercentage": 100}
    ]
}"##;
