//! Catalog of the permission codes the admin API seeds.
//!
//! Views should name the permissions they gate on through [`KnownPermission`]
//! instead of string literals. Codes outside the catalog are still accepted by
//! [`crate::PermissionSet`]; they simply have no typed name here.

use core::str::FromStr;

use thiserror::Error;

use crate::PermissionCode;

macro_rules! known_permissions {
    ($( $variant:ident => ($code:literal, $module:literal) ),+ $(,)?) => {
        /// A permission code known to this client build.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum KnownPermission {
            $( $variant, )+
        }

        impl KnownPermission {
            /// Every catalogued permission, grouped by module.
            pub const ALL: &'static [KnownPermission] = &[ $( KnownPermission::$variant, )+ ];

            pub const fn code(self) -> &'static str {
                match self {
                    $( KnownPermission::$variant => $code, )+
                }
            }

            /// Display name of the admin module the permission belongs to.
            pub const fn module(self) -> &'static str {
                match self {
                    $( KnownPermission::$variant => $module, )+
                }
            }
        }

        impl FromStr for KnownPermission {
            type Err = UnknownPermission;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $code => Ok(KnownPermission::$variant), )+
                    other => Err(UnknownPermission(other.to_string())),
                }
            }
        }
    };
}

known_permissions! {
    ShowRole => ("show_role", "Role"),
    CreateRole => ("create_role", "Role"),
    ReadRole => ("read_role", "Role"),
    UpdateRole => ("update_role", "Role"),
    DeleteRole => ("delete_role", "Role"),

    ShowUser => ("show_user", "User"),
    CreateUser => ("create_user", "User"),
    ReadUser => ("read_user", "User"),
    UpdateUser => ("update_user", "User"),
    DeleteUser => ("delete_user", "User"),
    ToggleUser => ("toggle_user", "User"),

    CreateImage => ("create_image", "Image"),
    ReadImage => ("read_image", "Image"),
    UpdateImage => ("update_image", "Image"),
    DeleteImage => ("delete_image", "Image"),

    CreateImageCategory => ("create_image_category", "Image Category"),
    ReadImageCategory => ("read_image_category", "Image Category"),
    UpdateImageCategory => ("update_image_category", "Image Category"),
    DeleteImageCategory => ("delete_image_category", "Image Category"),

    ShowPermission => ("show_permission", "Permission"),
    CreatePermission => ("create_permission", "Permission"),
    ReadPermission => ("read_permission", "Permission"),
    UpdatePermission => ("update_permission", "Permission"),
    DeletePermission => ("delete_permission", "Permission"),

    CreateEmployee => ("create_employee", "Employee"),
    ReadEmployee => ("read_employee", "Employee"),
    UpdateEmployee => ("update_employee", "Employee"),
    DeleteEmployee => ("delete_employee", "Employee"),

    CreateDepartment => ("create_department", "Department"),
    ReadDepartment => ("read_department", "Department"),
    UpdateDepartment => ("update_department", "Department"),
    DeleteDepartment => ("delete_department", "Department"),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown permission code '{0}'")]
pub struct UnknownPermission(pub String);

impl AsRef<str> for KnownPermission {
    fn as_ref(&self) -> &str {
        self.code()
    }
}

impl core::fmt::Display for KnownPermission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

impl From<KnownPermission> for PermissionCode {
    fn from(value: KnownPermission) -> Self {
        PermissionCode::new(value.code())
    }
}
