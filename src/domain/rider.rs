/// A rider identity, as used by the dispatch simulation pool.
#[derive(Debug, Clone)]
pub struct Rider {
    pub id: String,
    pub name: String,
    pub phone: String,
}

impl Rider {
    pub fn new(id: impl Into<String>, name: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            phone: phone.into(),
        }
    }
}
