use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories::accounts::{AccountChanges, NewAccount};

/// Makes sure the configured administrator account exists and is active.
pub(crate) async fn ensure_admin(state: &AppState) -> anyhow::Result<()> {
    let admin = state.settings().admin();
    if admin.first_admin_email.is_empty() {
        tracing::warn!("FIRST_ADMIN_EMAIL not configured; skipping admin account creation");
        return Ok(());
    }

    let email = admin.first_admin_email.trim().to_lowercase();
    let store = state.store();
    let now = primitive_now_utc();

    if let Some(account) = store.find_account_by_email(&email).await? {
        if !account.is_admin {
            tracing::warn!(%email, "Bootstrap admin email belongs to a non-admin account");
            return Ok(());
        }
        if !account.is_active {
            store
                .update_account(
                    &account.id,
                    AccountChanges { full_name: None, is_active: Some(true), updated_at: now },
                )
                .await?;
            tracing::info!(%email, "Reactivated default admin account");
        } else {
            tracing::info!("Default admin account already up to date");
        }
        return Ok(());
    }

    let account = NewAccount {
        id: uuid::Uuid::new_v4().to_string(),
        email: email.clone(),
        full_name: admin.first_admin_name.clone(),
        is_active: true,
        is_admin: true,
        date_joined: now,
    };
    store.create_account(account, None).await?;

    tracing::info!(%email, "Created default admin account");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::setup_test_context;

    #[tokio::test]
    async fn ensure_admin_is_idempotent() {
        let ctx = setup_test_context().await;

        ensure_admin(&ctx.state).await.expect("first run");
        ensure_admin(&ctx.state).await.expect("second run");

        let email = ctx.state.settings().admin().first_admin_email.clone();
        let account = ctx.state.store().find_account_by_email(&email).await.unwrap().unwrap();
        assert!(account.is_admin);
        assert!(account.is_active);
    }
}
