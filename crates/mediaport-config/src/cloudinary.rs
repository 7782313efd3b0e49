use url::Url;

use crate::disk::CloudinaryDiskConfig;
use crate::error::ConfigError;

impl CloudinaryDiskConfig {
  /// Parse a `cloudinary://<api_key>:<api_secret>@<cloud_name>` connection string.
  pub fn from_url(value: &str) -> Result<Self, ConfigError> {
    let parsed =
      Url::parse(value).map_err(|e| ConfigError::InvalidCloudinaryUrl(e.to_string()))?;

    if parsed.scheme() != "cloudinary" {
      return Err(ConfigError::InvalidCloudinaryUrl(format!(
        "expected cloudinary:// scheme, got {}://",
        parsed.scheme()
      )));
    }

    let cloud_name = parsed.host_str().unwrap_or_default().to_string();
    let api_key = parsed.username().to_string();
    let api_secret = parsed.password().unwrap_or_default().to_string();

    if cloud_name.is_empty() || api_key.is_empty() || api_secret.is_empty() {
      return Err(ConfigError::InvalidCloudinaryUrl(
        "url must carry api key, api secret and cloud name".to_string(),
      ));
    }

    Ok(Self {
      cloud_name,
      api_key,
      api_secret,
      secure: true,
      api_base: None,
      delivery_host: None,
    })
  }
}
