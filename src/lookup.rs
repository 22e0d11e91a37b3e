//! Weather and domain lookups.

use anyhow::Result;
use reqwest::blocking::Client;
use std::collections::BTreeMap;
use std::net::{IpAddr, ToSocketAddrs};
use std::time::Duration;
use thiserror::Error;

use crate::config::get_settings;
use crate::shell::run_command;
use crate::ui::{input_prompt, pager, with_spinner, Note, Term};

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("could not build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("server answered {0}")]
    Status(reqwest::StatusCode),
    #[error("could not resolve {domain}: {source}")]
    Resolve {
        domain: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{0} has no addresses")]
    NoAddresses(String),
    #[error("nslookup: {0}")]
    Nslookup(#[from] crate::shell::ShellError),
    #[error("no {0} records")]
    NoRecords(&'static str),
    #[error("'{0}' is not a domain name")]
    InvalidDomain(String),
}

/// What the user typed at a lookup prompt.
#[derive(Debug, PartialEq, Eq)]
pub enum Query {
    Cancel,
    Empty,
    Value(String),
}

pub fn classify_query(input: Option<String>) -> Query {
    match input.as_deref().map(str::trim) {
        None | Some("0") => Query::Cancel,
        Some("") => Query::Empty,
        Some(v) => Query::Value(v.to_string()),
    }
}

fn client(timeout: Duration) -> Result<Client, LookupError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("curl/8 crunchyutils/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(LookupError::Client)
}

fn timeout() -> Duration {
    Duration::from_secs(get_settings().http_timeout_secs.max(1))
}

// ── Weather ───────────────────────────────────────────────────────────────────

pub fn weather_url(template: &str, city: &str) -> String {
    template.replace("{city}", &urlencoding::encode(city))
}

/// The service explains bad input (e.g. "Unknown location") in the body, so
/// the body is kept whatever the status. Only an empty error body fails.
pub fn weather_body(status: reqwest::StatusCode, body: String) -> Result<String, LookupError> {
    if !status.is_success() {
        tracing::warn!(%status, "weather service answered with an error status");
        if body.trim().is_empty() {
            return Err(LookupError::Status(status));
        }
    }
    Ok(body)
}

pub fn fetch_weather(url: &str, timeout: Duration) -> Result<String, LookupError> {
    let response = client(timeout)?.get(url).send()?;
    let status = response.status();
    weather_body(status, response.text()?)
}

pub fn weather(terminal: &mut Term) -> Result<()> {
    let title = "Weather";
    let input = input_prompt(terminal, title, "Enter city (e.g. Chicago), 0 to cancel")?;
    let city = match classify_query(input) {
        Query::Cancel => return Ok(()),
        Query::Empty => return pager(terminal, title, &[Note::plain("Please input a city")]),
        Query::Value(city) => city,
    };

    let url = weather_url(&get_settings().weather_url, &city);
    tracing::info!(%url, "fetching weather");
    let t = timeout();
    let result = with_spinner(terminal, title, &[], "Weather...", move || fetch_weather(&url, t))?;

    let notes = match result {
        Ok(body) => {
            let mut notes: Vec<Note> = body.lines().map(Note::accent).collect();
            notes.push(Note::success("Finished getting weather infos from wttr.in"));
            notes
        }
        Err(e) => {
            tracing::warn!(error = %e, "weather lookup failed");
            vec![Note::error("Failed to get weather info"), Note::plain(format!("  {e}"))]
        }
    };
    pager(terminal, title, &notes)
}

// ── DNS ───────────────────────────────────────────────────────────────────────

pub fn resolve_ips(domain: &str) -> Result<Vec<IpAddr>, LookupError> {
    let addrs = (domain, 0u16)
        .to_socket_addrs()
        .map_err(|source| LookupError::Resolve { domain: domain.to_string(), source })?;
    let mut ips: Vec<IpAddr> = Vec::new();
    for addr in addrs {
        if !ips.contains(&addr.ip()) {
            ips.push(addr.ip());
        }
    }
    if ips.is_empty() {
        return Err(LookupError::NoAddresses(domain.to_string()));
    }
    Ok(ips)
}

fn clean_host(host: &str) -> String {
    host.trim().trim_end_matches('.').to_string()
}

/// Nameserver hosts from `nslookup -type=ns` output.
pub fn parse_nameservers(out: &str) -> Vec<String> {
    out.lines()
        .filter_map(|line| line.split_once("nameserver = ").map(|(_, host)| clean_host(host)))
        .filter(|h| !h.is_empty())
        .collect()
}

/// `(host, preference)` pairs from `nslookup -type=mx` output, in either the
/// BIND (`mail exchanger = 10 host.`) or Windows
/// (`MX preference = 10, mail exchanger = host`) layout.
pub fn parse_mail_servers(out: &str) -> Vec<(String, u16)> {
    let mut servers = Vec::new();
    for line in out.lines() {
        let Some((head, tail)) = line.split_once("mail exchanger = ") else {
            continue;
        };
        if let Some((_, pref)) = head.split_once("MX preference = ") {
            let pref = pref.trim().trim_end_matches(',').trim();
            if let Ok(pref) = pref.parse() {
                servers.push((clean_host(tail), pref));
            }
        } else {
            let mut parts = tail.split_whitespace();
            if let (Some(pref), Some(host)) = (parts.next(), parts.next()) {
                if let Ok(pref) = pref.parse() {
                    servers.push((clean_host(host), pref));
                }
            }
        }
    }
    servers
}

fn nslookup(kind: &str, domain: &str) -> Result<String, LookupError> {
    let argv = vec!["nslookup".to_string(), format!("-type={kind}"), domain.to_string()];
    Ok(run_command(&argv)?)
}

pub fn nameservers(domain: &str) -> Result<Vec<String>, LookupError> {
    let ns = parse_nameservers(&nslookup("ns", domain)?);
    if ns.is_empty() {
        return Err(LookupError::NoRecords("NS"));
    }
    Ok(ns)
}

pub fn mail_servers(domain: &str) -> Result<Vec<(String, u16)>, LookupError> {
    let mx = parse_mail_servers(&nslookup("mx", domain)?);
    if mx.is_empty() {
        return Err(LookupError::NoRecords("MX"));
    }
    Ok(mx)
}

// ── HTTP headers ──────────────────────────────────────────────────────────────

/// Response headers of a HEAD request, repeated names joined with ", ".
pub fn head_headers(url: &str, timeout: Duration) -> Result<BTreeMap<String, String>, LookupError> {
    let response = client(timeout)?.head(url).send()?;
    let mut headers: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in response.headers() {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        headers
            .entry(name.as_str().to_string())
            .and_modify(|v| {
                v.push_str(", ");
                v.push_str(&value);
            })
            .or_insert(value);
    }
    Ok(headers)
}

fn header_section(notes: &mut Vec<Note>, title: &str, headers: &BTreeMap<String, String>) {
    notes.push(Note::accent(format!("# {title}:")));
    for (k, v) in headers {
        notes.push(Note::plain(format!("  {k}: {v}")));
    }
}

// ── Domain report ─────────────────────────────────────────────────────────────

/// Everything we can find out about `domain`. Only the address lookup is
/// required; other sections are skipped when they fail. Names starting with
/// `-` are refused since `nslookup` would take them as options.
pub fn domain_report(domain: &str, timeout: Duration) -> Result<Vec<Note>, LookupError> {
    if domain.starts_with('-') {
        return Err(LookupError::InvalidDomain(domain.to_string()));
    }
    let ips = resolve_ips(domain)?;
    let mut notes = vec![
        Note::accent(format!("# Domain Info for {domain}:")),
        Note::accent("# IP Addresses:"),
    ];
    notes.extend(ips.iter().map(|ip| Note::plain(format!("  {ip}"))));

    match nameservers(domain) {
        Ok(ns) => {
            notes.push(Note::accent("# Nameservers:"));
            notes.extend(ns.iter().map(|n| Note::plain(format!("  {n}"))));
        }
        Err(e) => tracing::debug!(error = %e, "skipping nameservers"),
    }

    match mail_servers(domain) {
        Ok(mx) => {
            notes.push(Note::accent("# Mail Servers (MX):"));
            notes.extend(mx.iter().map(|(host, pref)| Note::plain(format!("  {host} (Pref {pref})"))));
        }
        Err(e) => tracing::debug!(error = %e, "skipping mail servers"),
    }

    for (scheme, title) in [("http", "HTTP Headers"), ("https", "HTTPS Headers")] {
        match head_headers(&format!("{scheme}://{domain}"), timeout) {
            Ok(headers) => header_section(&mut notes, title, &headers),
            Err(e) => tracing::debug!(%scheme, error = %e, "skipping headers"),
        }
    }
    Ok(notes)
}

pub fn domain_info(terminal: &mut Term) -> Result<()> {
    let title = "Domain Info";
    let input = input_prompt(terminal, title, "Enter domain (e.g. google.com), 0 to cancel")?;
    let domain = match classify_query(input) {
        Query::Cancel => return Ok(()),
        Query::Empty => return pager(terminal, title, &[Note::plain("Please input a domain")]),
        Query::Value(domain) => domain,
    };

    tracing::info!(%domain, "domain lookup");
    let t = timeout();
    let lookup_domain = domain.clone();
    let result = with_spinner(terminal, title, &[], "Domain infos...", move || {
        domain_report(&lookup_domain, t)
    })?;

    let notes = match result {
        Ok(mut notes) => {
            notes.push(Note::success("Finished getting infos"));
            notes
        }
        Err(e) => {
            tracing::warn!(%domain, error = %e, "domain lookup failed");
            vec![Note::error("Failed to lookup domain"), Note::plain(format!("  {e}"))]
        }
    };
    pager(terminal, title, &notes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queries_cancel_on_zero_or_escape() {
        assert_eq!(classify_query(None), Query::Cancel);
        assert_eq!(classify_query(Some(" 0 ".into())), Query::Cancel);
        assert_eq!(classify_query(Some("  ".into())), Query::Empty);
        assert_eq!(classify_query(Some("Chicago".into())), Query::Value("Chicago".into()));
    }

    #[test]
    fn option_like_domains_are_refused() {
        for input in ["-type=any", "-debug", "-querytype=any"] {
            assert!(matches!(
                domain_report(input, Duration::from_secs(1)),
                Err(LookupError::InvalidDomain(d)) if d == input
            ));
        }
    }

    #[test]
    fn weather_error_pages_are_shown() {
        let body = weather_body(reqwest::StatusCode::NOT_FOUND, "Unknown location; please try ~Paris".into());
        assert_eq!(body.unwrap(), "Unknown location; please try ~Paris");
        assert!(matches!(
            weather_body(reqwest::StatusCode::BAD_GATEWAY, " \n".into()),
            Err(LookupError::Status(_))
        ));
        assert_eq!(weather_body(reqwest::StatusCode::OK, "Paris: Sunny".into()).unwrap(), "Paris: Sunny");
    }

    #[test]
    fn weather_url_encodes_city() {
        let url = weather_url(crate::config::DEFAULT_WEATHER_URL, "New York");
        assert_eq!(url, "https://wttr.in/New%20York?format=%l:+%C+%t+%w");
        assert_eq!(weather_url("http://x/{city}", "Zürich"), "http://x/Z%C3%BCrich");
    }

    #[test]
    fn parses_bind_nslookup_output() {
        let ns = "Server:\t\t127.0.0.53\nAddress:\t127.0.0.53#53\n\nNon-authoritative answer:\n\
                  example.com\tnameserver = a.iana-servers.net.\n\
                  example.com\tnameserver = b.iana-servers.net.\n";
        assert_eq!(parse_nameservers(ns), vec!["a.iana-servers.net", "b.iana-servers.net"]);

        let mx = "Non-authoritative answer:\ngoogle.com\tmail exchanger = 10 smtp.google.com.\n";
        assert_eq!(parse_mail_servers(mx), vec![("smtp.google.com".to_string(), 10)]);
    }

    #[test]
    fn parses_windows_nslookup_output() {
        let mx = "google.com      MX preference = 10, mail exchanger = smtp.google.com\n\
                  google.com      MX preference = 20, mail exchanger = alt.google.com\n";
        assert_eq!(
            parse_mail_servers(mx),
            vec![("smtp.google.com".to_string(), 10), ("alt.google.com".to_string(), 20)]
        );
        let ns = "google.com      nameserver = ns1.google.com\n";
        assert_eq!(parse_nameservers(ns), vec!["ns1.google.com"]);
    }

    #[test]
    fn junk_output_yields_nothing() {
        assert!(parse_mail_servers("** server can't find nope.invalid: NXDOMAIN").is_empty());
        assert!(parse_nameservers("").is_empty());
    }

    #[test]
    fn localhost_resolves() {
        let ips = resolve_ips("localhost").unwrap();
        assert!(ips.iter().any(|ip| ip.is_loopback()));
    }
}
