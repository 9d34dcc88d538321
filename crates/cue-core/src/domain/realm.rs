//! Network realms.
//!
//! A task only *declares* where its logic should run; deciding which machine
//! actually executes it belongs to the host scheduler.

use serde::{Deserialize, Serialize};

/// Where a task's logic is meant to execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskRealm {
    /// Cosmetic logic; never needed on a dedicated server.
    ClientOnly,

    /// Server authoritative, mirrored on clients.
    ServerAndClient,

    /// Runs independently on both sides.
    #[default]
    ClientAndServer,
}

/// The realm an invocation is currently executing under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NetworkRealm {
    #[default]
    Standalone,
    Client,
    ListenServer,
    DedicatedServer,
}

impl NetworkRealm {
    pub fn is_dedicated_server(self) -> bool {
        matches!(self, NetworkRealm::DedicatedServer)
    }
}

impl TaskRealm {
    /// Advisory check used by the reference timeline driver.
    pub fn runs_in(self, realm: NetworkRealm) -> bool {
        match self {
            TaskRealm::ClientOnly => !realm.is_dedicated_server(),
            TaskRealm::ServerAndClient | TaskRealm::ClientAndServer => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::standalone(NetworkRealm::Standalone, true)]
    #[case::client(NetworkRealm::Client, true)]
    #[case::listen_server(NetworkRealm::ListenServer, true)]
    #[case::dedicated(NetworkRealm::DedicatedServer, false)]
    fn client_only_skips_dedicated_server(#[case] realm: NetworkRealm, #[case] expected: bool) {
        assert_eq!(TaskRealm::ClientOnly.runs_in(realm), expected);
        assert!(TaskRealm::ClientAndServer.runs_in(realm));
        assert!(TaskRealm::ServerAndClient.runs_in(realm));
    }

    #[test]
    fn realm_serializes_as_snake_case() {
        let s = serde_json::to_string(&TaskRealm::ClientOnly).unwrap();
        assert_eq!(s, "\"client_only\"");
    }
}
