/// A request body to benchmark, built by repeating a unit document.
#[derive(Debug, Clone)]
pub struct TestPayload {
    name: &'static str,
    content: String,
}

impl TestPayload {
    pub fn new(name: &'static str, content: String) -> Self {
        Self { name, content }
    }

    pub fn repeat(name: &'static str, unit: &str, times: usize) -> Self {
        Self::new(name, unit.repeat(times))
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct TestCase {
    group: TestGroup,
    payload: TestPayload,
}

impl TestCase {
    pub fn new(group: TestGroup, payload: TestPayload) -> Self {
        Self { group, payload }
    }

    pub fn small(payload: TestPayload) -> Self {
        Self::new(TestGroup::Small, payload)
    }

    pub fn normal(payload: TestPayload) -> Self {
        Self::new(TestGroup::Normal, payload)
    }

    pub fn large(payload: TestPayload) -> Self {
        Self::new(TestGroup::Large, payload)
    }

    pub fn name(&self) -> &'static str {
        self.payload.name()
    }

    pub fn group(&self) -> TestGroup {
        self.group
    }

    pub fn payload(&self) -> &TestPayload {
        &self.payload
    }
}

#[derive(Clone, Copy, Debug)]
pub enum TestGroup {
    Small,
    Normal,
    Large,
}

/// One line of a bulk indexing request.
pub const BULK_LINE: &str = "{\"index\":{\"_index\":\"docs\"}}\n{\"title\":\"micro search\",\"tags\":[\"rust\",\"http\"],\"views\":1024}\n";

/// Small, normal and large bulk bodies.
pub fn bulk_cases() -> Vec<TestCase> {
    vec![
        TestCase::small(TestPayload::repeat("bulk_1", BULK_LINE, 1)),
        TestCase::normal(TestPayload::repeat("bulk_64", BULK_LINE, 64)),
        TestCase::large(TestPayload::repeat("bulk_4096", BULK_LINE, 4096)),
    ]
}
