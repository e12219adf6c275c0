pub struct Foo {
    pub id: u64,
}

pub struct FooBar {
    pub id: u64,
    pub foo: Foo,
}

#[cfg(feature = "extra")]
pub struct Extra {
    pub enabled: bool,
}
