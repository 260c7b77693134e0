//! Login/register form submission and logout

use crate::model::{ApiError, AuthMode};
use super::AppController;

impl AppController {
    /// Submit the auth form in its current mode.
    ///
    /// Required-field validation happens here; the API never sees empty
    /// credentials. On failure the session is unchanged and the error lands
    /// on the form for display.
    pub async fn submit_auth(&self) {
        let model = self.model.lock().await;
        let form = model.get_auth_form().await;
        if form.submitting {
            return;
        }

        let missing = match form.mode {
            AuthMode::Login => form.email.trim().is_empty() || form.password.is_empty(),
            AuthMode::Register => {
                form.email.trim().is_empty()
                    || form.username.trim().is_empty()
                    || form.password.is_empty()
            }
        };
        if missing {
            model.set_auth_error("All fields are required.".to_string()).await;
            return;
        }

        let Some(session) = model.get_session().await else {
            return;
        };
        model.set_auth_submitting(true).await;
        drop(model);

        let result = match form.mode {
            AuthMode::Login => {
                session
                    .login(form.email.trim(), &form.password, form.remember)
                    .await
            }
            AuthMode::Register => {
                session
                    .register(form.email.trim(), form.username.trim(), &form.password)
                    .await
            }
        };

        let model = self.model.lock().await;
        model.set_auth_submitting(false).await;
        match result {
            Ok(()) => {
                tracing::info!("Authenticated");
                model.reset_auth_form().await;
                drop(model);
                self.load_initial_content().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Authentication failed");
                let message = match &e {
                    // A 401 here means bad credentials, not an expired session.
                    ApiError::Unauthorized => "Incorrect email or password.".to_string(),
                    other => Self::format_error(other),
                };
                model.set_auth_error(message).await;
            }
        }
    }

    /// End the session: stop playback, clear fetched content, drop the
    /// credential everywhere. Cannot fail.
    pub async fn logout(&self) {
        let model = self.model.lock().await;
        let Some(session) = model.get_session().await else {
            return;
        };
        let player = model.player();

        session.logout().await;
        player.lock().await.pause();
        model.clear_user_content().await;
    }
}
