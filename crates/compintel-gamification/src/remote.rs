//! Client for the host application's gamification endpoint.

use std::time::Duration;

use reqwest::{Client, Url};
use uuid::Uuid;

use crate::activity::Activity;
use crate::error::GamificationError;

pub struct RemoteGamificationClient {
    client: Client,
    endpoint: Url,
    token: Option<String>,
}

impl RemoteGamificationClient {
    /// # Errors
    ///
    /// Returns [`GamificationError::InvalidEndpoint`] if `endpoint` does not
    /// parse, or [`GamificationError::Http`] if the client cannot be built.
    pub fn new(
        endpoint: &str,
        token: Option<String>,
        timeout_secs: u64,
    ) -> Result<Self, GamificationError> {
        let endpoint = Url::parse(endpoint).map_err(|e| GamificationError::InvalidEndpoint {
            url: endpoint.to_string(),
            reason: e.to_string(),
        })?;
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(5))
            .build()?;

        Ok(Self {
            client,
            endpoint,
            token,
        })
    }

    /// POSTs one activity on behalf of `user_id`.
    ///
    /// # Errors
    ///
    /// Returns [`GamificationError::Http`] on transport failure or
    /// [`GamificationError::Rejected`] on a non-2xx status.
    pub async fn record(&self, user_id: Uuid, activity: &Activity) -> Result<(), GamificationError> {
        let mut request = self
            .client
            .post(self.endpoint.clone())
            .header("x-user-id", user_id.to_string())
            .json(activity);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(GamificationError::Rejected {
                status: response.status().as_u16(),
            });
        }
        Ok(())
    }
}
