use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        pub struct $name(pub i64);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                std::fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

id_newtype!(RecordId);
id_newtype!(StudentId);
id_newtype!(SubjectId);

impl RecordId {
    /// The backend never hands out 0, so it is treated the same as no id at all.
    pub fn is_assigned(self) -> bool {
        self.0 != 0
    }
}
