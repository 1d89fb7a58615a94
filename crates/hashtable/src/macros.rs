macro_rules! boxentry {
    ( $key: expr, $value: expr) => {
        Box::new($crate::chain::Entry {
            key: $key.into(),
            value: $value,
            next: None,
        })
    };
}
pub(crate) use boxentry;

#[cfg(test)]
macro_rules! entry {
    ( $key: expr, $value: expr) => {
        $crate::chain::Entry {
            key: $key.into(),
            value: $value,
            next: None,
        }
    };
}
#[cfg(test)]
pub(crate) use entry;
