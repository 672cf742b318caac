use crate::Asset;

/// The unit handed to host callbacks: exactly one asset.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    data: Asset,
}

impl Record {
    pub fn new(data: Asset) -> Self {
        Record { data }
    }

    pub fn data(&self) -> &Asset {
        &self.data
    }

    pub fn into_data(self) -> Asset {
        self.data
    }
}

impl From<Asset> for Record {
    fn from(data: Asset) -> Self {
        Record::new(data)
    }
}
