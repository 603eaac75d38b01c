use crate::error::{Error, Result};

use ini::{Ini, Properties};
use std::collections::HashMap;

pub const DEFAULT_INI_FILE_PATH: &str = "~/.httpbuf";
pub const DEFAULT_INI_SECTION: &str = "default";

const INI_HOST: &str = "host";
const INI_USER: &str = "user";
const INI_PASSWORD: &str = "password";
const INI_CA_CERT: &str = "ca_cert";
const INI_INSECURE: &str = "insecure";

const HEADER_PREFIX: &str = "@";
const VARIABLE_PREFIX: &str = "$";

/// One section of the profile file.
#[derive(Debug, Default, Clone)]
pub struct IniProfile {
    host: Option<String>,
    user: Option<String>,
    password: Option<String>,
    insecure: bool,
    ca_cert: Option<String>,
    headers: HashMap<String, String>,
    variables: HashMap<String, String>,
}

impl IniProfile {
    /// Loads profile `name`. A missing `default` profile is not an error;
    /// any other name has to exist.
    pub fn load(file_path: &str, name: &str) -> Result<Option<IniProfile>> {
        let extended_path = shellexpand::tilde(file_path).to_string();
        if !std::path::Path::new(&extended_path).exists() {
            tracing::debug!(path = %extended_path, "profile file not found");
            return Self::missing(name);
        }

        let ini = Ini::load_from_file(&extended_path)?;
        let section = match ini.section(Some(name)) {
            Some(s) => s,
            None => return Self::missing(name),
        };

        Ok(Some(Self::from_section(section)?))
    }

    fn missing(name: &str) -> Result<Option<IniProfile>> {
        if name == DEFAULT_INI_SECTION {
            Ok(None)
        } else {
            Err(Error::ProfileNotFound(name.to_string()))
        }
    }

    fn from_section(section: &Properties) -> Result<IniProfile> {
        let mut headers = HashMap::new();
        let mut variables = HashMap::new();
        for (key, value) in section.iter() {
            if let Some(stripped) = key.strip_prefix(HEADER_PREFIX) {
                headers.insert(stripped.to_lowercase(), value.to_string());
            } else if let Some(stripped) = key.strip_prefix(VARIABLE_PREFIX) {
                variables.insert(stripped.to_string(), value.to_string());
            }
        }

        let insecure = match section.get(INI_INSECURE) {
            Some(s) => s.trim().parse::<bool>().map_err(|_| {
                Error::InvalidArgument(format!("{INI_INSECURE} must be true or false, got '{s}'"))
            })?,
            None => false,
        };

        let get = |key: &str| section.get(key).map(|s| s.to_string());

        Ok(IniProfile {
            host: get(INI_HOST),
            user: get(INI_USER),
            password: get(INI_PASSWORD),
            insecure,
            ca_cert: get(INI_CA_CERT),
            headers,
            variables,
        })
    }

    pub fn host(&self) -> Option<&String> {
        self.host.as_ref()
    }

    pub fn user(&self) -> Option<&String> {
        self.user.as_ref()
    }

    pub fn password(&self) -> Option<&String> {
        self.password.as_ref()
    }

    pub fn insecure(&self) -> bool {
        self.insecure
    }

    pub fn ca_cert(&self) -> Option<&String> {
        self.ca_cert.as_ref()
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    pub fn variables(&self) -> &HashMap<String, String> {
        &self.variables
    }
}
