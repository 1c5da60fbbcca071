use crate::models::MenuEntry;

/// MenuNode
///
/// A sidebar node: either a leaf link or a submenu that owns its children.
/// A submenu may also have a path of its own (it is then active like a link).
#[derive(Debug, Clone, PartialEq)]
pub enum MenuNode {
    Link {
        label: &'static str,
        path: &'static str,
    },
    Submenu {
        label: &'static str,
        path: Option<&'static str>,
        children: Vec<MenuNode>,
    },
}

impl MenuNode {
    pub fn label(&self) -> &'static str {
        match self {
            MenuNode::Link { label, .. } | MenuNode::Submenu { label, .. } => *label,
        }
    }

    pub fn path(&self) -> Option<&'static str> {
        match self {
            MenuNode::Link { path, .. } => Some(*path),
            MenuNode::Submenu { path, .. } => *path,
        }
        .filter(|p| !p.is_empty())
    }

    pub fn children(&self) -> &[MenuNode] {
        match self {
            MenuNode::Link { .. } => &[],
            MenuNode::Submenu { children, .. } => children.as_slice(),
        }
    }

    /// The node's own path is a prefix of `current`. Nodes without a path are never active.
    pub fn is_active(&self, current: &str) -> bool {
        self.path().is_some_and(|path| current.starts_with(path))
    }

    /// Some descendant, at any depth, is active.
    pub fn has_active_child(&self, current: &str) -> bool {
        self.children()
            .iter()
            .any(|child| child.is_active(current) || child.has_active_child(current))
    }

    fn render(&self, current: Option<&str>) -> MenuEntry {
        MenuEntry {
            label: self.label().to_string(),
            path: self.path().map(str::to_string),
            active: current.is_some_and(|c| self.is_active(c)),
            open: current.is_some_and(|c| self.has_active_child(c)),
            children: self
                .children()
                .iter()
                .map(|child| child.render(current))
                .collect(),
        }
    }
}

fn link(label: &'static str, path: &'static str) -> MenuNode {
    MenuNode::Link { label, path }
}

fn submenu(label: &'static str, path: Option<&'static str>, children: Vec<MenuNode>) -> MenuNode {
    MenuNode::Submenu {
        label,
        path,
        children,
    }
}

/// Menu
///
/// A static sidebar tree. Built once at startup; rendering derives all state from
/// the path it is given. A menu with a fallback path renders as if that path were
/// current whenever the real one matches no node.
#[derive(Debug, Clone, PartialEq)]
pub struct Menu {
    items: Vec<MenuNode>,
    fallback: Option<&'static str>,
}

impl Menu {
    pub fn new(items: Vec<MenuNode>) -> Self {
        Self {
            items,
            fallback: None,
        }
    }

    pub fn with_fallback(mut self, path: &'static str) -> Self {
        self.fallback = Some(path);
        self
    }

    /// The administration sidebar.
    pub fn admin() -> Self {
        Self::new(vec![
            link("Dashboard", "/admin/dashboard"),
            submenu(
                "Courses",
                Some("/admin/courses"),
                vec![
                    link("Course list", "/admin/courses"),
                    link("Lessons", "/admin/lessons"),
                    link("Vocabulary", "/admin/words"),
                ],
            ),
            submenu(
                "Tests",
                None,
                vec![
                    link("Test list", "/admin/tests"),
                    link("Questions", "/admin/questions"),
                    link("Test results", "/admin/test-results"),
                ],
            ),
            submenu(
                "Users",
                None,
                vec![
                    link("User list", "/admin/admins"),
                    link("User groups", "/admin/admin-groups"),
                    link("Permissions", "/admin/permissions"),
                ],
            ),
            submenu(
                "Reports",
                None,
                vec![
                    link("Learning progress", "/admin/reports/progress"),
                    link("Learning results", "/admin/reports/results"),
                    link("Course statistics", "/admin/reports/courses"),
                ],
            ),
            link("Files", "/admin/minio"),
            submenu(
                "Demo",
                None,
                vec![
                    link("Demo components", "/admin/demo"),
                    link("API examples", "/admin/example"),
                ],
            ),
            submenu(
                "Settings",
                None,
                vec![
                    link("General", "/admin/settings/general"),
                    link("Devices", "/admin/settings/devices"),
                ],
            ),
        ])
    }

    /// The learner sidebar. Falls back to the course list.
    pub fn user() -> Self {
        Self::new(vec![
            link("My courses", "/user/courses"),
            link("Learning progress", "/user/progress"),
            link("Test results", "/user/tests"),
            link("Profile", "/user/profile"),
        ])
        .with_fallback("/user/courses")
    }

    pub fn items(&self) -> &[MenuNode] {
        &self.items
    }

    pub fn fallback(&self) -> Option<&'static str> {
        self.fallback
    }

    /// Some node, at any depth, is active for `current`.
    pub fn matches(&self, current: &str) -> bool {
        self.items
            .iter()
            .any(|node| node.is_active(current) || node.has_active_child(current))
    }

    /// Renders the tree for `current`. Without a fallback, a missing current path
    /// leaves nothing active or open.
    pub fn render(&self, current: Option<&str>) -> Vec<MenuEntry> {
        let current = match current {
            Some(path) if self.matches(path) => Some(path),
            _ => self.fallback.or(current),
        };
        self.items.iter().map(|node| node.render(current)).collect()
    }
}
