use mdflow_config::StorageSettings;

/// Builds object-storage URLs of experiment artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLocator {
  /// `<base>/<bucket>/<path>` with a trailing slash.
  prefix: String,
}

impl ArtifactLocator {
  pub fn new(base_url: &str, bucket: &str, path: &str) -> Self {
    let mut prefix = format!(
      "{}/{}/",
      base_url.trim_end_matches('/'),
      bucket.trim_matches('/')
    );
    let path = path.trim_matches('/');
    if !path.is_empty() {
      prefix.push_str(path);
      prefix.push('/');
    }
    Self { prefix }
  }

  /// Use the regional S3 endpoint unless the settings override the base URL.
  pub fn from_settings(storage: &StorageSettings) -> Self {
    let base_url = storage
      .base_url
      .clone()
      .unwrap_or_else(|| format!("http://s3.{}.amazonaws.com", storage.region));
    Self::new(&base_url, &storage.bucket, &storage.path)
  }

  /// Everything before the filename, ending in `/`.
  pub fn prefix(&self) -> &str {
    &self.prefix
  }

  pub fn url_for(&self, filename: &str) -> String {
    format!("{}{}", self.prefix, filename.trim_start_matches('/'))
  }
}
