use anyhow::Result;
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::config::{Config, SmtpConfig};

#[derive(Debug, Clone)]
pub struct InvitationEmail<'a> {
    pub to: &'a str,
    pub organization_name: &'a str,
    pub inviter_name: &'a str,
    pub token: &'a str,
    pub expires_in_days: i64,
}

/// Sends transactional mail over SMTP. Without SMTP configured it only logs,
/// which keeps local development working.
#[derive(Clone)]
pub struct EmailService {
    mailer: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from_address: String,
    app_base_url: String,
}

impl EmailService {
    pub fn from_config(config: &Config) -> Result<Self> {
        let mailer = match &config.smtp {
            Some(smtp) => Some(build_transport(smtp)?),
            None => None,
        };
        Ok(Self {
            mailer,
            from_address: config
                .smtp
                .as_ref()
                .map(|smtp| smtp.from_address.clone())
                .unwrap_or_else(|| "Leavedesk <no-reply@leavedesk.local>".to_string()),
            app_base_url: config.app_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn disabled(app_base_url: &str) -> Self {
        Self {
            mailer: None,
            from_address: "Leavedesk <no-reply@leavedesk.local>".to_string(),
            app_base_url: app_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn invitation_link(&self, token: &str) -> String {
        format!("{}/invitations/accept?token={}", self.app_base_url, token)
    }

    pub async fn send_invitation(&self, invitation: InvitationEmail<'_>) -> Result<()> {
        let link = self.invitation_link(invitation.token);
        let Some(mailer) = &self.mailer else {
            tracing::info!(
                to = invitation.to,
                organization = invitation.organization_name,
                link = %link,
                "SMTP not configured; invitation email not sent"
            );
            return Ok(());
        };

        let body = format!(
            "{inviter} invited you to join {org} on Leavedesk.\n\n\
             Accept the invitation here:\n\n{link}\n\n\
             The link expires in {days} days.\n",
            inviter = invitation.inviter_name,
            org = invitation.organization_name,
            link = link,
            days = invitation.expires_in_days,
        );

        let email = Message::builder()
            .from(self.from_address.parse()?)
            .to(invitation.to.parse()?)
            .subject(format!("You're invited to {}", invitation.organization_name))
            .header(ContentType::TEXT_PLAIN)
            .body(body)?;

        mailer.send(email).await?;
        Ok(())
    }
}

fn build_transport(smtp: &SmtpConfig) -> Result<AsyncSmtpTransport<Tokio1Executor>> {
    let transport = match (&smtp.username, &smtp.password) {
        (Some(username), Some(password)) => {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&smtp.host)?
                .port(smtp.port)
                .credentials(Credentials::new(username.clone(), password.clone()))
                .build()
        }
        _ => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&smtp.host)
            .port(smtp.port)
            .build(),
    };
    Ok(transport)
}
