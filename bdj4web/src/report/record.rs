//! One installer event from the telemetry log

pub const UNKNOWN_COUNTRY: &str = "unknown";

/// A parsed `===BEGIN` / `===END` block.
///
/// Every logged field is optional. `bdj3_version`, `old_version`, `locale`
/// and `system_locale` start out as empty strings because older installers
/// never sent them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallRecord {
    pub version: Option<String>,
    pub release_level: Option<String>,
    pub build_date: Option<String>,
    pub date: Option<String>,
    pub new: Option<String>,
    pub reinstall: Option<String>,
    pub overwrite: Option<String>,
    pub update: Option<String>,
    pub convert: Option<String>,
    pub locale: Option<String>,
    pub system_locale: Option<String>,
    pub os: Option<String>,
    pub python_version: Option<String>,
    pub ip: Option<String>,
    pub old_version: Option<String>,
    pub bdj3_version: Option<String>,

    /// `version-releaselevel-builddate`, set when the block closes
    pub full_version: String,
    /// Resolved from `ip`; `unknown` until a lookup succeeds
    pub country: String,
}

impl Default for InstallRecord {
    fn default() -> Self {
        Self {
            version: None,
            release_level: None,
            build_date: None,
            date: None,
            new: None,
            reinstall: None,
            overwrite: None,
            update: None,
            convert: None,
            locale: Some(String::new()),
            system_locale: Some(String::new()),
            os: None,
            python_version: None,
            ip: None,
            old_version: Some(String::new()),
            bdj3_version: Some(String::new()),
            full_version: String::new(),
            country: UNKNOWN_COUNTRY.to_string(),
        }
    }
}

impl InstallRecord {
    /// Store a logged `-key` / value pair. Returns false for unknown keys.
    pub fn set(&mut self, key: &str, value: &str) -> bool {
        let field = match key {
            "-version" => &mut self.version,
            "-releaselevel" => &mut self.release_level,
            "-builddate" => &mut self.build_date,
            "-date" => &mut self.date,
            "-new" => &mut self.new,
            "-reinstall" => &mut self.reinstall,
            "-overwrite" => &mut self.overwrite,
            "-update" => &mut self.update,
            "-convert" => &mut self.convert,
            "-locale" => &mut self.locale,
            "-systemlocale" => &mut self.system_locale,
            "-osdisp" => &mut self.os,
            "-pythonvers" => &mut self.python_version,
            "-ip" => &mut self.ip,
            "-oldversion" => &mut self.old_version,
            "-bdj3version" => &mut self.bdj3_version,
            _ => return false,
        };
        *field = Some(value.to_string());
        true
    }

    /// Derive the full version and apply the historical data fixes.
    pub fn finish(&mut self) {
        self.full_version = format!(
            "{}-{}-{}",
            self.version.as_deref().unwrap_or_default(),
            self.release_level.as_deref().unwrap_or_default(),
            self.build_date.as_deref().unwrap_or_default(),
        );

        if let Some(old) = self.old_version.as_mut() {
            *old = old.replace(' ', "-");
        }

        // early installers logged re-installs as "overwrite"
        if let Some(overwrite) = self.overwrite.take() {
            self.reinstall = Some(overwrite);
        }

        // and flagged a new install as a re-install too
        if self.new_count() > 0 && self.reinstall.is_some() {
            self.reinstall = Some("0".to_string());
        }
    }

    pub fn new_count(&self) -> u64 {
        flag_value(&self.new)
    }

    pub fn reinstall_count(&self) -> u64 {
        flag_value(&self.reinstall)
    }

    pub fn update_count(&self) -> u64 {
        flag_value(&self.update)
    }

    pub fn convert_count(&self) -> u64 {
        flag_value(&self.convert)
    }
}

fn flag_value(value: &Option<String>) -> u64 {
    value
        .as_deref()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(0)
}
