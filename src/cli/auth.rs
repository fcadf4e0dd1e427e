//! CLI handlers for login, logout, check, and whoami.

use crate::auth::{AuthProvider, AuthSession, Credentials};

/// Handle `crm login`.
pub async fn handle_login(
    session: &AuthSession,
    email: &str,
    password: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let outcome = session.login(Credentials::new(email, password)).await;
    if outcome.success {
        println!("✅ Logged in as {email}");
        return Ok(());
    }
    let failure = outcome.error.map_or_else(
        || "Login failed".to_string(),
        |error| format!("{}: {}", error.name, error.message),
    );
    Err(failure.into())
}

/// Handle `crm logout`.
pub async fn handle_logout(session: &AuthSession) -> Result<(), Box<dyn std::error::Error>> {
    session.logout().await;
    println!("Logged out");
    Ok(())
}

/// Handle `crm check`.
pub async fn handle_check(session: &AuthSession) -> Result<(), Box<dyn std::error::Error>> {
    let outcome = session.check().await;
    if outcome.authenticated {
        println!("✅ Authenticated");
        Ok(())
    } else {
        Err("Not authenticated. Run: crm login".into())
    }
}

/// Handle `crm whoami`.
pub async fn handle_whoami(session: &AuthSession) -> Result<(), Box<dyn std::error::Error>> {
    let Some(identity) = session.get_identity().await else {
        return Err("Not authenticated. Run: crm login".into());
    };
    println!("{} <{}>", identity.name, identity.email);
    if let Some(title) = identity.job_title {
        println!("   Title:    {title}");
    }
    if let Some(phone) = identity.phone {
        println!("   Phone:    {phone}");
    }
    if let Some(timezone) = identity.timezone {
        println!("   Timezone: {timezone}");
    }
    Ok(())
}
