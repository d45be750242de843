//! oneM2M enumerations carried as numbers on the wire.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Declares a fieldless enum with explicit wire values, plus the numeric
/// conversions serde uses to (de)serialize it.
macro_rules! numeric_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $value:expr, )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(into = "i64", try_from = "i64")]
        pub enum $name {
            $( $(#[$vmeta])* $variant, )+
        }

        impl $name {
            /// Wire value
            pub fn value(self) -> i64 {
                match self {
                    $( $name::$variant => $value, )+
                }
            }
        }

        impl From<$name> for i64 {
            fn from(v: $name) -> i64 {
                v.value()
            }
        }

        impl TryFrom<i64> for $name {
            type Error = String;

            fn try_from(v: i64) -> Result<Self, Self::Error> {
                match v {
                    $( x if x == $value => Ok($name::$variant), )+
                    other => Err(format!("{} is not a valid {}", other, stringify!($name))),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.value())
            }
        }

        impl From<$name> for serde_json::Value {
            fn from(v: $name) -> serde_json::Value {
                serde_json::Value::from(v.value())
            }
        }
    };
}

numeric_enum! {
    /// Resource types (TS-0004 Table 6.3.4.2.1-1)
    pub enum ResourceType {
        /// Mixed
        Mixed = 0,
        /// accessControlPolicy
        AccessControlPolicy = 1,
        /// AE
        Ae = 2,
        /// container
        Container = 3,
        /// contentInstance
        ContentInstance = 4,
        /// CSEBase
        CseBase = 5,
        /// delivery
        Delivery = 6,
        /// eventConfig
        EventConfig = 7,
        /// execInstance
        ExecInstance = 8,
        /// group
        Group = 9,
        /// locationPolicy
        LocationPolicy = 10,
        /// m2mServiceSubscriptionProfile
        M2mServiceSubscription = 11,
        /// mgmtCmd
        MgmtCmd = 12,
        /// mgmtObj
        MgmtObj = 13,
        /// node
        Node = 14,
        /// pollingChannel
        PollingChannel = 15,
        /// remoteCSE
        RemoteCse = 16,
        /// request
        Request = 17,
        /// schedule
        Schedule = 18,
        /// serviceSubscribedAppRule
        ServiceSubscribedAppRule = 19,
        /// serviceSubscribedNode
        ServiceSubscribedNode = 20,
        /// statsCollect
        StatsCollect = 21,
        /// statsConfig
        StatsConfig = 22,
        /// subscription
        Subscription = 23,
        /// semanticDescriptor
        SemanticDescriptor = 24,
        /// notificationTargetMgmtPolicyRef
        NotificationTargetMgmtPolicyRef = 25,
        /// notificationTargetPolicy
        NotificationTargetPolicy = 26,
        /// policyDeletionRules
        PolicyDeletionRules = 27,
        /// flexContainer
        FlexContainer = 28,
        /// timeSeries
        TimeSeries = 29,
        /// timeSeriesInstance
        TimeSeriesInstance = 30,
        /// role
        Role = 31,
        /// token
        Token = 32,
        /// trafficPattern
        TrafficPattern = 33,
        /// dynamicAuthorizationConsultation
        DynamicAuthorizationConsultation = 34,
        /// accessControlPolicyAnnc
        AccessControlPolicyAnnc = 10001,
        /// AEAnnc
        AeAnnc = 10002,
        /// containerAnnc
        ContainerAnnc = 10003,
        /// contentInstanceAnnc
        ContentInstanceAnnc = 10004,
        /// groupAnnc
        GroupAnnc = 10009,
        /// locationPolicyAnnc
        LocationPolicyAnnc = 10010,
        /// mgmtObjAnnc
        MgmtObjAnnc = 10013,
        /// nodeAnnc
        NodeAnnc = 10014,
        /// remoteCSEAnnc
        RemoteCseAnnc = 10016,
        /// scheduleAnnc
        ScheduleAnnc = 10018,
        /// semanticDescriptorAnnc
        SemanticDescriptorAnnc = 10024,
        /// flexContainerAnnc
        FlexContainerAnnc = 10028,
        /// timeSeriesAnnc
        TimeSeriesAnnc = 10029,
        /// timeSeriesInstanceAnnc
        TimeSeriesInstanceAnnc = 10030,
        /// trafficPatternAnnc
        TrafficPatternAnnc = 10033,
        /// dynamicAuthorizationConsultationAnnc
        DynamicAuthorizationConsultationAnnc = 10034,
    }
}

numeric_enum! {
    /// Result content selector (`rcn`)
    pub enum ResultContent {
        /// Nothing
        Nothing = 0,
        /// Attributes
        Attributes = 1,
        /// Hierarchical address
        HierarchicalAddress = 2,
        /// Hierarchical address and attributes
        HierarchicalAddressPlusAttributes = 3,
        /// Attributes and child resources
        AttributesPlusChildResources = 4,
        /// Attributes and child resource references
        AttributesPlusChildResourceReferences = 5,
        /// Child resource references
        ChildResourceReferences = 6,
        /// Original resource
        OriginalResource = 7,
        /// Child resources
        ChildResources = 8,
    }
}

numeric_enum! {
    /// Filter usage (`fu`)
    pub enum FilterUsage {
        /// Unspecified
        Unspecified = -1,
        /// Discovery
        Discovery = 1,
        /// Conditional retrieval
        ConditionalRetrieval = 2,
        /// IPE on-demand discovery
        IpeOnDemandDiscovery = 3,
    }
}

numeric_enum! {
    /// Notification event type (`net`)
    pub enum NotificationEventType {
        /// Unspecified
        Unspecified = -1,
        /// Update of resource
        UpdateOfResource = 1,
        /// Delete of resource
        DeleteOfResource = 2,
        /// Create of direct child resource
        CreateOfDirectChildResource = 3,
        /// Delete of direct child resource
        DeleteOfDirectChildResource = 4,
        /// Retrieve of container resource with no child resource
        RetrieveOfContainerResourceWithNoChildResource = 5,
    }
}

/// Response status codes (TS-0004 Table 6.6.3.x, subset).
///
/// Always compared and transported as strings; the `X-M2M-RSC` header is text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseStatusCode {
    /// 1000 Accepted
    Accepted,
    /// 2000 OK
    Ok,
    /// 2001 Created
    Created,
    /// 2002 Deleted
    Deleted,
    /// 2004 Updated
    Updated,
    /// 4000 Bad request
    BadRequest,
    /// 4004 Not found
    NotFound,
    /// 4005 Operation not allowed
    OperationNotAllowed,
    /// 4008 Request timeout
    RequestTimeout,
    /// 4103 Access denied
    AccessDenied,
    /// 4105 Conflict
    Conflict,
    /// 5000 Internal server error
    InternalServerError,
    /// 5001 Not implemented
    NotImplemented,
}

impl ResponseStatusCode {
    /// Wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accepted => "1000",
            Self::Ok => "2000",
            Self::Created => "2001",
            Self::Deleted => "2002",
            Self::Updated => "2004",
            Self::BadRequest => "4000",
            Self::NotFound => "4004",
            Self::OperationNotAllowed => "4005",
            Self::RequestTimeout => "4008",
            Self::AccessDenied => "4103",
            Self::Conflict => "4105",
            Self::InternalServerError => "5000",
            Self::NotImplemented => "5001",
        }
    }

    /// Parse a wire code; unknown codes yield `None`.
    pub fn from_code(code: &str) -> Option<Self> {
        let rsc = match code.trim() {
            "1000" => Self::Accepted,
            "2000" => Self::Ok,
            "2001" => Self::Created,
            "2002" => Self::Deleted,
            "2004" => Self::Updated,
            "4000" => Self::BadRequest,
            "4004" => Self::NotFound,
            "4005" => Self::OperationNotAllowed,
            "4008" => Self::RequestTimeout,
            "4103" => Self::AccessDenied,
            "4105" => Self::Conflict,
            "5000" => Self::InternalServerError,
            "5001" => Self::NotImplemented,
            _ => return None,
        };
        Some(rsc)
    }

    /// HTTP status carrying this code (TS-0009 Table 6.3.2-1)
    pub fn http_status(&self) -> http::StatusCode {
        use http::StatusCode;
        match self {
            Self::Accepted => StatusCode::ACCEPTED,
            Self::Ok | Self::Deleted | Self::Updated => StatusCode::OK,
            Self::Created => StatusCode::CREATED,
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::OperationNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::RequestTimeout => StatusCode::REQUEST_TIMEOUT,
            Self::AccessDenied => StatusCode::FORBIDDEN,
            Self::Conflict => StatusCode::CONFLICT,
            Self::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotImplemented => StatusCode::NOT_IMPLEMENTED,
        }
    }

    /// Is this a 2xxx success code?
    pub fn is_success(&self) -> bool {
        self.as_str().starts_with('2')
    }
}

impl fmt::Display for ResponseStatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_type_serializes_as_number() {
        assert_eq!(serde_json::to_string(&ResourceType::Subscription).unwrap(), "23");
        let ty: ResourceType = serde_json::from_str("10002").unwrap();
        assert_eq!(ty, ResourceType::AeAnnc);
        assert!(serde_json::from_str::<ResourceType>("9999").is_err());
    }

    #[test]
    fn test_negative_wire_values() {
        assert_eq!(FilterUsage::Unspecified.value(), -1);
        assert_eq!(
            NotificationEventType::try_from(-1).unwrap(),
            NotificationEventType::Unspecified
        );
    }

    #[test]
    fn test_rsc_string_representation() {
        assert_eq!(ResponseStatusCode::Created.as_str(), "2001");
        assert_eq!(ResponseStatusCode::from_code("2001"), Some(ResponseStatusCode::Created));
        assert_eq!(ResponseStatusCode::from_code("2001 "), Some(ResponseStatusCode::Created));
        assert_eq!(ResponseStatusCode::from_code("9999"), None);
    }

    #[test]
    fn test_rsc_http_mapping() {
        assert_eq!(ResponseStatusCode::Created.http_status(), http::StatusCode::CREATED);
        assert_eq!(ResponseStatusCode::Deleted.http_status(), http::StatusCode::OK);
        assert_eq!(ResponseStatusCode::NotFound.http_status(), http::StatusCode::NOT_FOUND);
        assert!(ResponseStatusCode::Updated.is_success());
        assert!(!ResponseStatusCode::NotFound.is_success());
    }
}
