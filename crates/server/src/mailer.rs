use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials, AsyncSendmailTransport,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::config::SmtpConfig;

type MailError = Box<dyn std::error::Error + Send + Sync>;

/// Send a login code by email
pub async fn send_otp_email(
    smtp_config: &SmtpConfig,
    to_email: &str,
    code: &str,
    ttl_minutes: i64,
) -> Result<(), MailError> {
    let email = Message::builder()
        .from(format!("{} <{}>", smtp_config.from_name, smtp_config.from_email).parse()?)
        .to(to_email.parse()?)
        .subject("Virtual Wandelen - Uw inlogcode")
        .header(ContentType::TEXT_HTML)
        .body(otp_body(code, ttl_minutes))?;

    if smtp_config.use_sendmail {
        AsyncSendmailTransport::<Tokio1Executor>::new().send(email).await?;
        return Ok(());
    }

    let creds = Credentials::new(smtp_config.username.clone(), smtp_config.password.clone());
    let mailer: AsyncSmtpTransport<Tokio1Executor> =
        AsyncSmtpTransport::<Tokio1Executor>::relay(&smtp_config.host)?
            .credentials(creds)
            .port(smtp_config.port)
            .build();

    mailer.send(email).await?;
    Ok(())
}

fn otp_body(code: &str, ttl_minutes: i64) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>Inlogcode</title>
</head>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333; max-width: 600px; margin: 0 auto; padding: 20px;">
    <h2 style="color: #2f855a;">Virtual Wandelen</h2>
    <p>Gebruik de volgende code om in te loggen:</p>
    <p style="text-align: center; margin: 30px 0; font-size: 32px; letter-spacing: 8px; font-weight: bold;">{}</p>
    <p style="margin-top: 30px; color: #666; font-size: 14px;">Deze code is {} minuten geldig.</p>
    <p style="color: #666; font-size: 14px;">Heeft u deze code niet aangevraagd? Dan kunt u deze e-mail negeren.</p>
</body>
</html>"#,
        code, ttl_minutes
    )
}
