//! Integration tests for the VHR service.
//!
//! This suite verifies the full startup of the `vhr` binary by:
//! 1. Applying the schema from `db/sql/01_vhr.sql` to an existing PostgreSQL
//!    database named by `VHR_TEST_DSN` (the test skips when it is unset).
//! 2. Spawning the actual `vhr` binary as a supervised child process.
//! 3. Driving the login flow and the security pipeline with real HTTP
//!    requests, verification code included.

use anyhow::{bail, Context, Result};
use serde_json::Value;
use sqlx::{Connection, PgConnection};
use std::{
    env,
    net::TcpListener,
    process::{Child, Command, Stdio},
    time::Duration,
};
use tokio::time::sleep;
use uuid::Uuid;

const VHR_SCHEMA_SQL: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/db/sql/01_vhr.sql"));

// Cost 4 keeps bcrypt fast enough for test setup.
const TEST_COST: u32 = 4;

struct ChildGuard(Child);

impl Drop for ChildGuard {
    fn drop(&mut self) {
        let _ = self.0.kill();
        let _ = self.0.wait();
    }
}

async fn apply_schema(connection: &mut PgConnection, sql: &str) -> Result<()> {
    for (index, statement) in split_sql_statements(sql).iter().enumerate() {
        sqlx::query(statement)
            .execute(&mut *connection)
            .await
            .with_context(|| format!("Failed to execute schema statement {}", index + 1))?;
    }
    Ok(())
}

fn split_sql_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut in_dollar_quote = false;

    for line in sql.lines() {
        let trimmed = line.trim();
        current.push_str(line);
        current.push('\n');

        let dollar_markers = line.match_indices("$$").count();
        if dollar_markers % 2 == 1 {
            in_dollar_quote = !in_dollar_quote;
        }

        if !in_dollar_quote && trimmed.ends_with(';') {
            let statement = current.trim();
            if !statement.is_empty() {
                statements.push(statement.to_string());
            }
            current.clear();
        }
    }

    let leftover = current.trim();
    if !leftover.is_empty() {
        statements.push(leftover.to_string());
    }

    statements
}

fn pick_port() -> Result<u16> {
    let listener = TcpListener::bind("127.0.0.1:0").context("Failed to bind a local port")?;
    Ok(listener
        .local_addr()
        .context("Failed to read local port")?
        .port())
}

async fn wait_for_ready(client: &reqwest::Client, base: &str) -> Result<()> {
    for _ in 0..40 {
        match client.get(format!("{base}/health")).send().await {
            Ok(resp) if resp.status().is_success() => return Ok(()),
            _ => sleep(Duration::from_millis(250)).await,
        }
    }
    bail!("vhr did not become ready at {base}");
}

/// Pull the rendered glyphs back out of the verification code SVG.
fn code_from_svg(svg: &str) -> String {
    svg.split("</text>")
        .filter_map(|chunk| {
            let start = chunk.rfind('>')?;
            chunk[start + 1..].chars().next()
        })
        .collect()
}

async fn fetch_code(client: &reqwest::Client, base: &str) -> Result<String> {
    let response = client.get(format!("{base}/verifyCode")).send().await?;
    if response.status() != reqwest::StatusCode::OK {
        bail!("verifyCode answered {}", response.status());
    }
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    if content_type != "image/svg+xml" {
        bail!("verifyCode content type was {content_type}");
    }
    let svg = response.text().await?;
    let code = code_from_svg(&svg);
    if code.len() != 4 {
        bail!("could not parse a code out of the SVG: {svg}");
    }
    Ok(code)
}

/// Fetch a fresh verification code, then log in with it.
async fn login(
    client: &reqwest::Client,
    base: &str,
    username: &str,
    password: &str,
) -> Result<Value> {
    let code = fetch_code(client, base).await?;
    let response = client
        .post(format!("{base}/doLogin"))
        .form(&[
            ("username", username),
            ("password", password),
            ("code", code.as_str()),
        ])
        .send()
        .await?;
    if response.status() != reqwest::StatusCode::OK {
        bail!("doLogin answered {}", response.status());
    }
    Ok(response.json().await?)
}

#[tokio::test]
async fn server_guards_routes_and_completes_login_flow() -> Result<()> {
    let Ok(dsn) = env::var("VHR_TEST_DSN") else {
        eprintln!("Skipping integration test: VHR_TEST_DSN not set");
        return Ok(());
    };

    let mut conn = PgConnection::connect(&dsn)
        .await
        .context("Failed to connect to Postgres")?;
    apply_schema(&mut conn, VHR_SCHEMA_SQL).await?;

    // Reset the seeded hashes so the test controls the password.
    let hash = bcrypt::hash("123", TEST_COST)?;
    sqlx::query("UPDATE operators SET password_hash = $1")
        .bind(&hash)
        .execute(&mut conn)
        .await?;

    let port = pick_port()?;
    let base = format!("http://127.0.0.1:{port}");

    let mut command = Command::new(env!("CARGO_BIN_EXE_vhr"));
    command.env("VHR_LOG_LEVEL", "info");
    // Clear conflicting env vars that might leak from the host
    command.env_remove("VHR_DB_USERNAME");
    command.env_remove("VHR_DB_PASSWORD");
    command.env_remove("VHR_PORT");

    let _child = ChildGuard(
        command
            .args(["--port", &port.to_string(), "--dsn", &dsn])
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .context("Failed to spawn vhr binary")?,
    );

    let client = reqwest::Client::builder().cookie_store(true).build()?;

    wait_for_ready(&client, &base).await?;

    // Health carries the X-App header.
    let health = client.get(format!("{base}/health")).send().await?;
    assert_eq!(health.status(), reqwest::StatusCode::OK);
    assert!(health.headers().contains_key("x-app"));

    // A protected path without a session answers the login-required envelope.
    let denied = client.get(format!("{base}/system/hr/")).send().await?;
    assert_eq!(denied.status(), reqwest::StatusCode::UNAUTHORIZED);
    let body: Value = denied.json().await?;
    assert_eq!(body["status"], 500);
    assert_eq!(body["msg"], "尚未登录，请登录");

    // A wrong code short-circuits the login; '0' is not in the code alphabet.
    fetch_code(&client, &base).await?;
    let response = client
        .post(format!("{base}/doLogin"))
        .form(&[("username", "admin"), ("password", "123"), ("code", "0000")])
        .send()
        .await?;
    assert_eq!(response.status(), reqwest::StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await?;
    assert_eq!(body["status"], 500);
    assert_eq!(body["msg"], "验证码填写错误");

    // Real login as the seeded admin.
    let body = login(&client, &base, "admin", "123").await?;
    assert_eq!(body["status"], 200);
    assert_eq!(body["msg"], "登录成功！");
    assert_eq!(body["obj"]["username"], "admin");
    assert_eq!(body["obj"]["password"], Value::Null);

    // The listing excludes the requester and never echoes hashes.
    let list = client.get(format!("{base}/system/hr/")).send().await?;
    assert_eq!(list.status(), reqwest::StatusCode::OK);
    let list_body: Value = list.json().await?;
    let operators = list_body.as_array().context("expected an array")?;
    assert!(operators.iter().any(|op| op["username"] == "libai"));
    assert!(operators.iter().all(|op| op["username"] != "admin"));
    assert!(operators.iter().all(|op| op["password"] == Value::Null));

    let libai_id = operators
        .iter()
        .find(|op| op["username"] == "libai")
        .and_then(|op| op["id"].as_str())
        .context("libai id missing")?
        .to_string();

    let roles_response = client
        .get(format!("{base}/system/hr/roles"))
        .send()
        .await?;
    assert_eq!(roles_response.status(), reqwest::StatusCode::OK);
    let roles_body: Value = roles_response.json().await?;
    let roles = roles_body.as_array().context("expected an array")?;
    assert!(roles.iter().any(|role| role["name"] == "ROLE_manager"));
    assert!(roles.iter().all(|role| role["nameZh"].is_string()));

    // A malformed phone fails the update without changing the row.
    let update = client
        .put(format!("{base}/system/hr/"))
        .json(&serde_json::json!({
            "id": libai_id,
            "name": "李太白",
            "phone": "12345",
            "enabled": true
        }))
        .send()
        .await?;
    assert_eq!(update.status(), reqwest::StatusCode::OK);
    let body: Value = update.json().await?;
    assert_eq!(body["status"], 500);
    assert_eq!(body["msg"], "信息修改失败");

    // A valid update succeeds.
    let update = client
        .put(format!("{base}/system/hr/"))
        .json(&serde_json::json!({
            "id": libai_id,
            "name": "李太白",
            "phone": "18568123789",
            "enabled": true
        }))
        .send()
        .await?;
    let body: Value = update.json().await?;
    assert_eq!(body["status"], 200);
    assert_eq!(body["msg"], "信息修改成功");

    // Replace libai's role assignments.
    let manager_id = roles
        .iter()
        .find(|role| role["name"] == "ROLE_manager")
        .and_then(|role| role["id"].as_str())
        .context("manager role id missing")?;
    let personnel_id = roles
        .iter()
        .find(|role| role["name"] == "ROLE_personnel")
        .and_then(|role| role["id"].as_str())
        .context("personnel role id missing")?;

    let assign = client
        .put(format!("{base}/system/hr/role"))
        .json(&serde_json::json!({
            "id": libai_id,
            "role_ids": [manager_id, personnel_id]
        }))
        .send()
        .await?;
    let body: Value = assign.json().await?;
    assert_eq!(body["status"], 200);
    assert_eq!(body["msg"], "更新成功");

    // Deleting an absent operator reports failure.
    let delete = client
        .delete(format!("{base}/system/hr/{}", Uuid::new_v4()))
        .send()
        .await?;
    let body: Value = delete.json().await?;
    assert_eq!(body["status"], 500);
    assert_eq!(body["msg"], "删除失败");

    // Logout clears the session.
    let logout = client.get(format!("{base}/logout")).send().await?;
    assert_eq!(logout.status(), reqwest::StatusCode::OK);
    let body: Value = logout.json().await?;
    assert_eq!(body["msg"], "注销成功!");

    let denied = client.get(format!("{base}/system/hr/")).send().await?;
    assert_eq!(denied.status(), reqwest::StatusCode::UNAUTHORIZED);

    // A non-admin session is authenticated but not authorized for /system.
    let body = login(&client, &base, "libai", "123").await?;
    assert_eq!(body["status"], 200);

    let forbidden = client.get(format!("{base}/system/hr/")).send().await?;
    assert_eq!(forbidden.status(), reqwest::StatusCode::FORBIDDEN);
    let body: Value = forbidden.json().await?;
    assert_eq!(body["status"], 500);
    assert_eq!(body["msg"], "权限不足，请联系管理员");

    Ok(())
}

#[test]
fn binary_prints_help() -> Result<()> {
    let output = Command::new(env!("CARGO_BIN_EXE_vhr"))
        .arg("--help")
        .output()
        .context("Failed to run vhr --help")?;
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("HR management backend"));
    assert!(stdout.contains("--dsn"));
    Ok(())
}
