//! Domain layer health check functionality
//! Reports whether the document store answers a ping

use std::collections::HashMap;
use async_trait::async_trait;
use tracing::warn;

use medical_forms_data::repository::MedicalRecordRepositoryTrait;

/// Name of the store component in health reports
pub const DATABASE_COMPONENT: &str = "database";

/// System health status
#[derive(Debug, Clone, PartialEq)]
pub enum SystemStatus {
    /// All components are healthy
    Healthy,
    /// System is not functioning properly
    Unhealthy,
}

/// Component health status
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentStatus {
    /// Component is functioning normally
    Healthy,
    /// Component is not functioning
    Unhealthy,
}

/// Represents a health component with status and optional details
#[derive(Debug, Clone)]
pub struct HealthComponent {
    /// Status of the component
    pub status: ComponentStatus,
    /// Optional details about the component status
    pub details: Option<String>,
}

/// Represents the overall health of the system
#[derive(Debug, Clone)]
pub struct SystemHealth {
    /// Overall system status
    pub status: SystemStatus,
    /// Map of component names to their health status
    pub components: HashMap<String, HealthComponent>,
}

/// Trait for health services
#[async_trait]
pub trait HealthServiceTrait: Send + Sync {
    /// Get the overall system health
    async fn get_system_health(&self) -> SystemHealth;
}

/// Health service backed by a repository ping
#[derive(Debug, Clone)]
pub struct StoreHealthService<R: MedicalRecordRepositoryTrait> {
    repository: R,
}

impl<R: MedicalRecordRepositoryTrait> StoreHealthService<R> {
    /// Create a health service over the given repository
    pub fn new(repository: R) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl<R: MedicalRecordRepositoryTrait> HealthServiceTrait for StoreHealthService<R> {
    async fn get_system_health(&self) -> SystemHealth {
        let database = match self.repository.ping().await {
            Ok(()) => HealthComponent {
                status: ComponentStatus::Healthy,
                details: None,
            },
            Err(e) => {
                warn!("Document store ping failed: {}", e);
                HealthComponent {
                    status: ComponentStatus::Unhealthy,
                    details: Some(e.to_string()),
                }
            }
        };

        let status = if database.status == ComponentStatus::Healthy {
            SystemStatus::Healthy
        } else {
            SystemStatus::Unhealthy
        };

        SystemHealth {
            status,
            components: vec![(DATABASE_COMPONENT.to_string(), database)].into_iter().collect(),
        }
    }
}
