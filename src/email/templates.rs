pub fn render_password_reset(reset_url: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"></head>
<body style="font-family: sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
    <h2>Password reset</h2>
    <p>A password reset was requested for your account.</p>
    <p><a href="{reset_url}" style="display: inline-block; padding: 10px 20px; background: #0070f3; color: white; text-decoration: none; border-radius: 4px;">Reset password</a></p>
    <p style="color: #666; font-size: 14px;">This link expires in 24 hours. If you didn't request this, you can ignore it.</p>
</body>
</html>"#
    )
}

pub fn render_password_changed() -> String {
    r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"></head>
<body style="font-family: sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
    <h2>Password changed</h2>
    <p>The password for your account was just changed using a reset link.</p>
    <p style="color: #666; font-size: 14px;">If this wasn't you, contact an administrator immediately.</p>
</body>
</html>"#
        .to_string()
}
