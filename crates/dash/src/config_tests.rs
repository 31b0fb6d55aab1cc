// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::Parser;

use super::*;

fn parse(args: &[&str]) -> Result<DashConfig, clap::Error> {
    let mut full = vec!["ticketdash"];
    full.extend_from_slice(args);
    DashConfig::try_parse_from(full)
}

fn required_args() -> Vec<&'static str> {
    vec![
        "--auth-url",
        "https://idp.example/auth",
        "--token-url",
        "https://idp.example/token",
        "--logout-url",
        "https://idp.example/logout",
        "--settings-url",
        "https://idp.example/account",
        "--info-url",
        "https://idp.example/info",
        "--client-id",
        "dash-client",
        "--client-secret",
        "dash-secret",
    ]
}

#[test]
fn defaults_fill_the_bind_address_and_server_url() -> anyhow::Result<()> {
    let config = parse(&required_args())?;
    assert_eq!(config.host, "127.0.0.1");
    assert_eq!(config.port, 8080);
    assert_eq!(config.server_url, "http://localhost:8080");
    Ok(())
}

#[test]
fn missing_provider_endpoint_fails_parsing() {
    let mut args = required_args();
    args.drain(0..2); // drop --auth-url
    assert!(parse(&args).is_err());
}

#[yare::parameterized(
    without_trailing_slash = { "https://dash.example", "https://dash.example/auth/callback" },
    with_trailing_slash = { "https://dash.example/", "https://dash.example/auth/callback" },
)]
fn callback_url_normalizes_the_base(server_url: &str, expect: &str) {
    let mut args = required_args();
    args.extend_from_slice(&["--server-url", server_url]);
    let config = parse(&args).expect("valid args");
    assert_eq!(config.callback_url(), expect);
}

#[test]
fn post_logout_url_points_at_the_root() -> anyhow::Result<()> {
    let mut args = required_args();
    args.extend_from_slice(&["--server-url", "https://dash.example/"]);
    assert_eq!(parse(&args)?.post_logout_url(), "https://dash.example/");
    Ok(())
}

#[test]
fn oidc_client_carries_the_token_endpoint_and_credentials() -> anyhow::Result<()> {
    let oidc = parse(&required_args())?.oidc_client();
    assert_eq!(oidc.token_url, "https://idp.example/token");
    assert_eq!(oidc.client_id, "dash-client");
    assert_eq!(oidc.client_secret, "dash-secret");
    Ok(())
}
