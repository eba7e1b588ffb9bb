mod package;
mod run;

pub use self::package::{DependencyEdge, Package};
pub use self::run::RunRecord;

pub(crate) use self::package::PackageRow;
pub(crate) use self::run::RunRow;
