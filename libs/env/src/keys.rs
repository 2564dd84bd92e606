//! The fixed registry vocabulary.

use crate::define_keys;

define_keys! {
    /// Settings read from the process environment.
    pub enum EnvKey {
        // =====================================================================
        // Identity
        // =====================================================================
        AuthUrl => "auth_url", "OS_AUTH_URL", [];
        Region => "region", "OS_REGION_NAME", ["OS_REGION"];
        ProjectName => "project_name", "OS_PROJECT_NAME", ["OS_TENANT_NAME"];
        TenantId => "tenant_id", "OS_PROJECT_ID", ["OS_TENANT_ID"];
        DomainName => "domain_name", "OS_DOMAIN_NAME", ["OS_USER_DOMAIN_NAME"];
        UserName => "user_name", "OS_USERNAME", [];
        Password => "password", "OS_PASSWORD", [], secret;
        Token => "token", "OS_TOKEN", ["OS_AUTH_TOKEN"], secret;
        AccessKey => "access_key", "OS_ACCESS_KEY", [];
        SecretKey => "secret_key", "OS_SECRET_KEY", [], secret;

        // =====================================================================
        // Shared infrastructure
        // =====================================================================
        VpcId => "vpc_id", "OS_VPC_ID", [];
        SubnetId => "subnet_id", "OS_SUBNET_ID", [];
        NetworkId => "network_id", "OS_NETWORK_ID", [];
        AvailabilityZone => "availability_zone", "OS_AVAILABILITY_ZONE", [];
        ImageId => "image_id", "OS_IMAGE_ID", [];
        FlavorId => "flavor_id", "OS_FLAVOR_ID", [];
        FlavorName => "flavor_name", "OS_FLAVOR_NAME", [];
        KeypairName => "keypair_name", "OS_KEYPAIR_NAME", [];
        BmsFlavorName => "bms_flavor_name", "OS_BMS_FLAVOR_NAME", [];
        NicId => "nic_id", "OS_NIC_ID", [];
        ExtgwId => "extgw_id", "OS_EXTGW_ID", [];
        PoolName => "pool_name", "OS_POOL_NAME", [];

        // =====================================================================
        // TLS material (path or inline PEM)
        // =====================================================================
        CaCert => "cacert", "OS_CACERT", [];
        Cert => "cert", "OS_CERT", [];
        Key => "key", "OS_KEY", [], secret;
    }
}

define_keys! {
    /// Boolean flags that open feature-gated test families.
    pub enum EnvFlag {
        Dcs => "dcs", "OS_DCS_ENVIRONMENT", [];
        Dms => "dms", "OS_DMS_ENVIRONMENT", [];
        Mrs => "mrs", "OS_MRS_ENVIRONMENT", [];
        Swift => "swift", "OS_SWIFT_ENVIRONMENT", [];
        Vpn => "vpn", "OS_VPN_ENVIRONMENT", [];
        SslTests => "ssl_tests", "OS_SSL_TESTS", [];
        TenantAdmin => "tenant_admin", "OS_TENANT_ADMIN", [];
        Deprecated => "deprecated_environment", "OS_DEPRECATED_ENVIRONMENT", [];
        Maas => "maas", "OS_MAAS_ENVIRONMENT", [];
    }
}
