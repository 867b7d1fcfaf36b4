use std::env;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    Supabase,
}

/// Booking rules that can be switched per deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingPolicy {
    /// Reject bookings that fall outside the dentist's weekly availability template.
    pub enforce_dentist_availability: bool,
    /// Accept bookings for services that have been soft-deleted.
    pub allow_inactive_services: bool,
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self {
            enforce_dentist_availability: false,
            allow_inactive_services: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_jwt_secret: String,
    pub port: u16,
    pub storage_backend: StorageBackend,
    pub booking_policy: BookingPolicy,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let supabase_url = env::var("SUPABASE_URL")
            .unwrap_or_else(|_| {
                warn!("SUPABASE_URL not set, using empty value");
                String::new()
            });
        let supabase_anon_key = env::var("SUPABASE_ANON_PUBLIC_KEY")
            .unwrap_or_else(|_| {
                warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                String::new()
            });
        let supabase_jwt_secret = env::var("SUPABASE_JWT_SECRET")
            .unwrap_or_else(|_| {
                warn!("SUPABASE_JWT_SECRET not set, using empty value");
                String::new()
            });

        let port = match env::var("PORT") {
            Ok(raw) => raw.parse().unwrap_or_else(|_| {
                warn!("PORT '{}' is not a valid port, using 3000", raw);
                3000
            }),
            Err(_) => 3000,
        };

        let supabase_ready = !supabase_url.is_empty() && !supabase_anon_key.is_empty();
        let storage_backend = match env::var("STORAGE_BACKEND").ok().as_deref() {
            Some("supabase") => StorageBackend::Supabase,
            Some("memory") => StorageBackend::Memory,
            Some(other) => {
                warn!("Unknown STORAGE_BACKEND '{}', falling back to default", other);
                Self::default_backend(supabase_ready)
            }
            None => Self::default_backend(supabase_ready),
        };

        let booking_policy = BookingPolicy {
            enforce_dentist_availability: flag("BOOKING_ENFORCE_AVAILABILITY"),
            allow_inactive_services: flag("BOOKING_ALLOW_INACTIVE_SERVICES"),
        };

        let config = Self {
            supabase_url,
            supabase_anon_key,
            supabase_jwt_secret,
            port,
            storage_backend,
            booking_policy,
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    fn default_backend(supabase_ready: bool) -> StorageBackend {
        if supabase_ready {
            StorageBackend::Supabase
        } else {
            StorageBackend::Memory
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_jwt_secret.is_empty()
            && (self.storage_backend == StorageBackend::Memory
                || (!self.supabase_url.is_empty() && !self.supabase_anon_key.is_empty()))
    }
}

fn flag(name: &str) -> bool {
    match env::var(name) {
        Ok(value) => matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        Err(_) => false,
    }
}
