use lettre::message::{MultiPart, SinglePart, header};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::instrument;

use cuaderno_config::EmailConfig;
use cuaderno_core::AppError;

pub struct EmailService {
    config: EmailConfig,
}

impl EmailService {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    /// Mails a notification that was just stored for the user.
    #[instrument(skip(self, message))]
    pub async fn send_notification_email(
        &self,
        to_email: &str,
        to_name: &str,
        title: &str,
        message: &str,
    ) -> Result<(), AppError> {
        let link = format!("{}/notifications", self.config.frontend_url);
        let html_body = self.notification_template(to_name, title, message, &link);
        let text_body = format!(
            "Hola {},\n\n\
             {}\n\n\
             {}\n\n\
             Ver tus notificaciones: {}\n\n\
             Cuaderno",
            to_name, title, message, link
        );

        self.send_email(to_email, title, &text_body, &html_body)
            .await
    }

    #[instrument(skip(self, html_body, text_body))]
    async fn send_email(
        &self,
        to_email: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), AppError> {
        let from = format!("{} <{}>", self.config.from_name, self.config.from_email);

        let email = Message::builder()
            .from(
                from.parse()
                    .map_err(|e| AppError::internal_error(format!("Invalid from email: {}", e)))?,
            )
            .to(to_email
                .parse()
                .map_err(|e| AppError::internal_error(format!("Invalid to email: {}", e)))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )
            .map_err(|e| AppError::internal_error(format!("Failed to build email: {}", e)))?;

        let mailer = if self.config.smtp_username.is_empty() {
            SmtpTransport::builder_dangerous(&self.config.smtp_host)
                .port(self.config.smtp_port)
                .build()
        } else {
            let creds = Credentials::new(
                self.config.smtp_username.clone(),
                self.config.smtp_password.clone(),
            );

            SmtpTransport::relay(&self.config.smtp_host)
                .map_err(|e| {
                    AppError::internal_error(format!("Failed to create SMTP relay: {}", e))
                })?
                .port(self.config.smtp_port)
                .credentials(creds)
                .build()
        };

        tokio::task::spawn_blocking(move || mailer.send(&email))
            .await
            .map_err(|e| AppError::internal_error(format!("Task join error: {}", e)))?
            .map_err(|e| AppError::internal_error(format!("Failed to send email: {}", e)))?;

        Ok(())
    }

    fn notification_template(&self, name: &str, title: &str, message: &str, link: &str) -> String {
        format!(
            r#"<!DOCTYPE html>
<html lang="es">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
</head>
<body style="margin: 0; padding: 0; font-family: Arial, sans-serif; background-color: #f4f4f4;">
    <table width="100%" cellpadding="0" cellspacing="0" style="background-color: #f4f4f4; padding: 20px;">
        <tr>
            <td align="center">
                <table width="600" cellpadding="0" cellspacing="0" style="background-color: #ffffff; border-radius: 8px; overflow: hidden;">
                    <tr>
                        <td style="background-color: #0F766E; padding: 24px; text-align: center;">
                            <h1 style="margin: 0; color: #ffffff; font-size: 26px;">Cuaderno</h1>
                        </td>
                    </tr>
                    <tr>
                        <td style="padding: 32px 30px;">
                            <p style="margin: 0 0 16px 0; color: #666666; font-size: 16px;">Hola <strong>{name}</strong>,</p>
                            <h2 style="margin: 0 0 16px 0; color: #333333; font-size: 22px;">{title}</h2>
                            <p style="margin: 0 0 24px 0; color: #444444; font-size: 16px; line-height: 1.5; white-space: pre-line;">{message}</p>
                            <a href="{link}" style="display: inline-block; padding: 12px 32px; background-color: #0F766E; color: #ffffff; text-decoration: none; border-radius: 6px; font-size: 15px;">Ver notificaciones</a>
                        </td>
                    </tr>
                    <tr>
                        <td style="background-color: #f8f9fa; padding: 16px 30px; text-align: center; border-top: 1px solid #e9ecef;">
                            <p style="margin: 0; color: #999999; font-size: 12px;">
                                Recibís este correo porque tenés activadas las notificaciones por email en Cuaderno.
                            </p>
                        </td>
                    </tr>
                </table>
            </td>
        </tr>
    </table>
</body>
</html>"#,
            name = escape_html(name),
            title = escape_html(title),
            message = escape_html(message),
            link = escape_html(link),
        )
    }
}

fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<b>"Álgebra" & 'Física'</b>"#),
            "&lt;b&gt;&quot;Álgebra&quot; &amp; &#39;Física&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn test_notification_template_escapes_user_content() {
        let service = EmailService::new(EmailConfig::disabled());
        let html = service.notification_template(
            "Ana",
            "Nueva nota",
            "<script>alert(1)</script>",
            "http://localhost:5173/notifications",
        );

        assert!(html.contains("Hola <strong>Ana</strong>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
        assert!(html.contains(r#"href="http://localhost:5173/notifications""#));
    }
}
