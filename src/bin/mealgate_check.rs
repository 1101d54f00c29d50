//!
//! mealgate check binary
//! ---------------------
//! Ask the gate what it would do with a path, without running the server. The role is
//! either given directly or resolved from a cookie against a live identity provider.

use std::env;

use anyhow::{anyhow, Result};
use axum::http::{HeaderMap, HeaderValue};

use mealgate::backend::BackendClient;
use mealgate::config::{has_flag, parse_arg};
use mealgate::gate::{AccessGate, GateDecision, RouteTable};
use mealgate::identity::{RemoteSessionResolver, Role, SharedResolver, StaticSessionResolver};

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} --role <customer|provider|admin|none> <path>...\n  {program} --auth-url <url> --cookie \"<cookie header>\" <path>...\n  {program} --table\n\nFlags:\n  --role <r>         Evaluate as a signed-in user with this role; 'none' means signed out\n  --auth-url <url>   Resolve the session from this identity provider instead\n  --cookie <c>       Cookie header forwarded to the identity provider\n  --table            Print the route table and exit\n  -h, --help         Show this help\n\nExamples:\n  {program} --role provider /admin/users /provider/orders/123\n  {program} --role none /cart /meals"
    );
}

/// Positional arguments: everything that is neither a flag nor a flag's value.
fn positional(args: &[String]) -> Vec<String> {
    let valued = ["--role", "--auth-url", "--cookie"];
    let mut out = Vec::new();
    let mut i = 1;
    while i < args.len() {
        if valued.contains(&args[i].as_str()) {
            i += 2;
            continue;
        }
        if !args[i].starts_with("--") {
            out.push(args[i].clone());
        }
        i += 1;
    }
    out
}

fn resolver_from_args(args: &[String]) -> Result<SharedResolver> {
    if let Some(auth_url) = parse_arg(args, "--auth-url") {
        let backend = BackendClient::new(&auth_url, &auth_url)?;
        return Ok(std::sync::Arc::new(RemoteSessionResolver::new(backend)));
    }
    match parse_arg(args, "--role").as_deref() {
        Some("none") => Ok(std::sync::Arc::new(StaticSessionResolver::anonymous())),
        Some(r) => Ok(std::sync::Arc::new(StaticSessionResolver::with_role(Role::parse_lenient(r)))),
        None => Err(anyhow!("either --role or --auth-url is required")),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let program = args.first().cloned().unwrap_or_else(|| "mealgate_check".to_string());
    if has_flag(&args, "--help") || has_flag(&args, "-h") {
        print_usage(&program);
        return Ok(());
    }

    let table = RouteTable::default();
    if has_flag(&args, "--table") {
        println!("{:#?}", table);
        return Ok(());
    }

    let paths = positional(&args);
    if paths.is_empty() {
        print_usage(&program);
        return Err(anyhow!("no paths given"));
    }

    let mut headers = HeaderMap::new();
    if let Some(cookie) = parse_arg(&args, "--cookie") {
        headers.insert("cookie", HeaderValue::from_str(&cookie)?);
    }
    let gate = AccessGate::new(table, resolver_from_args(&args)?);
    for path in paths {
        let outcome = gate.check(&path, &headers).await;
        let role = outcome.user.as_ref().map(|u| u.role.to_string()).unwrap_or_else(|| "-".to_string());
        match outcome.decision {
            GateDecision::Allow => println!("{:<32} role={:<9} allow", path, role),
            GateDecision::Redirect(to) => println!("{:<32} role={:<9} redirect {}", path, role, to),
        }
    }
    Ok(())
}
